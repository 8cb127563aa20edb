//! Error types for schema forest construction

use thiserror::Error;

/// Result type for forest operations
pub type Result<T> = std::result::Result<T, ForestError>;

/// Schema forest errors
#[derive(Error, Debug)]
pub enum ForestError {
    #[error("Failed to decode discovery document: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid definition {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("TOML error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
