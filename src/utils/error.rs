use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Bridge request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Bridge error: {message}")]
    BridgeError { message: String },

    /// A load shared by several waiters failed; each waiter gets the same cause.
    #[error("Catalog load failed: {0}")]
    LoadFailed(#[source] Arc<CatalogError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
}

impl CatalogError {
    /// The error underneath any `LoadFailed` wrapping.
    pub fn root(&self) -> &CatalogError {
        match self {
            CatalogError::LoadFailed(inner) => inner.root(),
            other => other,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.root() {
            CatalogError::TransportError(_) | CatalogError::BridgeError { .. } => {
                ErrorSeverity::Medium
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.root() {
            CatalogError::TransportError(e) if e.is_timeout() => {
                "The spreadsheet bridge did not answer in time".to_string()
            }
            CatalogError::TransportError(_) | CatalogError::BridgeError { .. } => {
                "Could not fetch the course sheet from the bridge".to_string()
            }
            CatalogError::SerializationError(_) => {
                "The bridge returned data that is not valid JSON".to_string()
            }
            CatalogError::ConfigError { message } => format!("Invalid configuration: {}", message),
            CatalogError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
