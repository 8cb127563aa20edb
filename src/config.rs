//! Configuration management for schema forest builds
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (forest.toml)
//! - Environment variables (SCHEMA_FOREST__*)
//!
//! ## Example config file (forest.toml):
//! ```toml
//! [build]
//! token_length = 24
//! strict = false
//!
//! [export]
//! output_format = "compact"
//!
//! [source]
//! document = "discovery/openapi-v2.json"
//!
//! [search]
//! limit = 10
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ForestError, Result};

/// Shortest identity token that keeps collisions out of reach
pub const MIN_TOKEN_LENGTH: usize = 20;

/// Main configuration for forest builds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Discovery document source
    #[serde(default)]
    pub source: SourceConfig,

    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Length of the display token assigned to every node
    #[serde(default = "default_token_length")]
    pub token_length: usize,

    /// Abort on a malformed definition instead of skipping it
    #[serde(default)]
    pub strict: bool,
}

/// Export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

/// Where the CLI reads the discovery document from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to a discovery document (OpenAPI v2 as JSON)
    #[serde(default)]
    pub document: Option<PathBuf>,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of search results
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_token_length() -> usize {
    MIN_TOKEN_LENGTH
}

fn default_search_limit() -> usize {
    10
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            token_length: default_token_length(),
            strict: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
        }
    }
}

impl BuildConfig {
    /// Reject settings that would break forest invariants
    pub fn validate(&self) -> Result<()> {
        if self.token_length < MIN_TOKEN_LENGTH {
            return Err(ForestError::InvalidConfig(format!(
                "build.token_length must be at least {}, got {}",
                MIN_TOKEN_LENGTH, self.token_length
            )));
        }
        Ok(())
    }
}

impl ForestConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["forest.toml", ".forest.toml", "config/forest.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "schema-forest", "schema-forest") {
            let xdg_config = dirs.config_dir().join("forest.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMA_FOREST__BUILD__TOKEN_LENGTH=32
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_FOREST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.build.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the document path, resolving relative paths against the working directory
    pub fn document_path(&self) -> Option<PathBuf> {
        self.source.document.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ForestConfig::default();
        assert_eq!(config.build.token_length, MIN_TOKEN_LENGTH);
        assert!(!config.build.strict);
        assert_eq!(config.export.output_format, OutputFormat::Pretty);
        assert_eq!(config.search.limit, 10);
        assert!(config.build.validate().is_ok());
    }

    #[test]
    fn test_short_token_rejected() {
        let build = BuildConfig {
            token_length: 8,
            strict: false,
        };
        assert!(matches!(build.validate(), Err(ForestError::InvalidConfig(_))));
    }

    #[test]
    fn test_serialize_config() {
        let config = ForestConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[build]"));
        assert!(toml_str.contains("[export]"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.toml");
        let path_str = path.to_str().unwrap();

        let mut config = ForestConfig::default();
        config.build.token_length = 32;
        config.export.output_format = OutputFormat::Compact;
        config.save(path_str).unwrap();

        let loaded = ForestConfig::load_from(Some(path_str)).unwrap();
        assert_eq!(loaded.build.token_length, 32);
        assert_eq!(loaded.export.output_format, OutputFormat::Compact);
    }

    #[test]
    fn test_load_rejects_short_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[build]\ntoken_length = 4\n").unwrap();

        let result = ForestConfig::load_from(Some(path.to_str().unwrap()));
        assert!(matches!(result, Err(ForestError::InvalidConfig(_))));
    }
}
