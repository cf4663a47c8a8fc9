pub mod catalog;
pub mod loader;
pub mod normalize;

pub use crate::domain::model::{Course, Lesson, NamedRange, RawRow, SheetRanges};
pub use crate::domain::ports::{ConfigProvider, RangeFetcher};
pub use crate::utils::error::Result;
