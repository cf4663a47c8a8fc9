pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::HttpRangeFetcher;
pub use config::toml_config::TomlConfig;
pub use core::catalog::{CourseCatalog, CourseFilter, PriceFacet};
pub use core::loader::{CatalogLoader, LoadPhase};
pub use domain::model::{Course, Lesson};
pub use utils::error::{CatalogError, Result};
