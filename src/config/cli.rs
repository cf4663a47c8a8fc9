use crate::config::toml_config::{
    validate_provider, TomlConfig, DEFAULT_BRIDGE_ENDPOINT, DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::catalog::{CourseFilter, PriceFacet};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "course-sheets")]
#[command(about = "Load a course catalog from a published spreadsheet and query it")]
pub struct CliConfig {
    #[arg(long, help = "TOML file with a [source] section")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Spreadsheet id (overrides the config file)")]
    pub sheet_id: Option<String>,

    #[arg(long, help = "Spreadsheet-to-JSON bridge URL")]
    pub bridge_endpoint: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Case-insensitive text matched against title and description")]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long, help = "Price facet: free or paid")]
    pub price: Option<PriceFacet>,

    #[arg(long, help = "Print the course with this slug")]
    pub slug: Option<String>,

    #[arg(long, value_name = "COURSE_ID", help = "Print the lessons of a course")]
    pub lessons: Option<String>,

    #[arg(long, help = "Print the distinct course categories")]
    pub categories: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Fill options not given on the command line from a config file.
    pub fn merge_file(mut self, file: &TomlConfig) -> Self {
        self.sheet_id.get_or_insert_with(|| file.sheet_id().to_string());
        self.bridge_endpoint
            .get_or_insert_with(|| file.bridge_endpoint().to_string());
        self.timeout_seconds.get_or_insert(file.timeout_seconds());
        self.json_logs |= file.json_logs();
        self
    }

    /// Load and merge `--config` when it was given.
    pub fn resolve(self) -> Result<Self> {
        match &self.config {
            Some(path) => {
                let file = TomlConfig::from_file(path)?;
                Ok(self.merge_file(&file))
            }
            None => Ok(self),
        }
    }

    pub fn course_filter(&self) -> CourseFilter {
        CourseFilter {
            query: self.search.clone().unwrap_or_default(),
            category: self.category.clone(),
            price: self.price,
        }
    }
}

impl ConfigProvider for CliConfig {
    fn sheet_id(&self) -> &str {
        self.sheet_id.as_deref().unwrap_or("")
    }

    fn bridge_endpoint(&self) -> &str {
        self.bridge_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_BRIDGE_ENDPOINT)
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
