use crate::domain::model::SheetRanges;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Source of spreadsheet rows, grouped by named range.
#[async_trait]
pub trait RangeFetcher: Send + Sync {
    /// Fetch the `wanted` ranges of the sheet identified by `sheet_id`.
    ///
    /// Ranges the sheet does not have may simply be missing from the result.
    async fn fetch_ranges(&self, sheet_id: &str, wanted: &[&str]) -> Result<SheetRanges>;
}

pub trait ConfigProvider: Send + Sync {
    fn sheet_id(&self) -> &str;
    fn bridge_endpoint(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
}
