use crate::core::{ConfigProvider, NamedRange, RangeFetcher, RawRow, SheetRanges};
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Link under which a published Google sheet is handed to the bridge.
pub fn public_sheet_url(sheet_id: &str) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/{}/edit?usp=sharing",
        sheet_id
    )
}

/// Talks to a spreadsheet-to-JSON bridge over HTTP.
///
/// Sends `GET {endpoint}?key=<public sheet url>&wanted=courses,lessons` and
/// expects a JSON object keyed by range name. A range is either
/// `{"elements": [...]}` or a bare array of row objects.
#[derive(Debug, Clone)]
pub struct HttpRangeFetcher {
    client: Client,
    endpoint: String,
}

impl HttpRangeFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.bridge_endpoint(),
            Duration::from_secs(config.timeout_seconds()),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RangeFetcher for HttpRangeFetcher {
    async fn fetch_ranges(&self, sheet_id: &str, wanted: &[&str]) -> Result<SheetRanges> {
        let key = public_sheet_url(sheet_id);
        let wanted_param = wanted.join(",");

        tracing::debug!(
            "Making bridge request to: {} (ranges: {})",
            self.endpoint,
            wanted_param
        );
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", key.as_str()), ("wanted", wanted_param.as_str())])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Bridge response status: {}", status);

        if !status.is_success() {
            return Err(CatalogError::BridgeError {
                message: format!("bridge answered HTTP {} for sheet {}", status, sheet_id),
            });
        }

        let body = response.bytes().await?;
        let ranges = decode_ranges(&body, wanted)?;
        tracing::debug!("Bridge returned {} of {} wanted ranges", ranges.len(), wanted.len());

        Ok(ranges)
    }
}

/// Pick the wanted ranges out of a bridge response.
///
/// Only a body that is not a JSON object is an error. Other keys are ignored,
/// and a wanted range that can't be read comes back empty.
fn decode_ranges(body: &[u8], wanted: &[&str]) -> Result<SheetRanges> {
    let mut raw: HashMap<String, Value> = serde_json::from_slice(body)?;

    Ok(wanted
        .iter()
        .filter_map(|name| {
            let value = raw.remove(*name)?;
            Some((name.to_string(), read_range(name, value)))
        })
        .collect())
}

fn read_range(name: &str, value: Value) -> NamedRange {
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut range) => match range.remove("elements") {
            Some(Value::Array(rows)) => rows,
            _ => {
                tracing::warn!("Range '{}' has no elements list, treating as empty", name);
                Vec::new()
            }
        },
        other => {
            tracing::warn!("Range '{}' is not a row list ({}), treating as empty", name, other);
            Vec::new()
        }
    };

    rows.into_iter()
        .filter_map(|row| match row {
            Value::Object(cells) => Some(RawRow {
                data: cells.into_iter().collect(),
            }),
            other => {
                tracing::warn!("Skipping non-object row {} in range '{}'", other, name);
                None
            }
        })
        .collect::<Vec<_>>()
        .into()
}
