//! Logic for loading engine configuration in to an object model
use std::path::Path;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::schema::DEFAULT_CONNECTION_SUFFIX;
use crate::synthesize::DEFAULT_MAX_DEPTH;
use crate::synthesize::DEFAULT_PAGE_SIZE;

/// Configuration error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("could not read configuration file: {0}")]
    CannotReadFile(#[from] std::io::Error),
    #[error("could not deserialize configuration: {0}")]
    DeserializeConfigError(#[from] serde_yaml::Error),
    #[error("{message}: {error}")]
    InvalidConfiguration { message: &'static str, error: String },
}

/// The configuration for the selection engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// The `first` argument given to every connection the engine paginates.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// How many levels of nested objects a synthesized selection may descend.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Type names ending with this suffix are treated as connections.
    #[serde(default = "default_connection_suffix")]
    pub connection_suffix: String,

    /// Root type name for each resource, used when every field is requested
    /// without an explicit type.
    #[serde(default)]
    pub resources: IndexMap<String, String>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_connection_suffix() -> String {
    DEFAULT_CONNECTION_SUFFIX.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_depth: default_max_depth(),
            connection_suffix: default_connection_suffix(),
            resources: IndexMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parses a YAML (or JSON, which is valid YAML) configuration document.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Looks up the root type registered for a resource.
    pub fn root_type_for(&self, resource: &str) -> Option<&str> {
        self.resources.get(resource).map(String::as_str)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.default_page_size == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid default_page_size",
                error: "must be greater than zero".to_string(),
            });
        }
        if self.connection_suffix.is_empty() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid connection_suffix",
                error: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
