//! Configuration for the component knowledge service
//!
//! Sources are merged with the `config` crate. Precedence, lowest to highest:
//! built-in defaults, global file (`$XDG_CONFIG_HOME/component-knowledge/config.toml`),
//! an explicit file, then `COMPONENT_KNOWLEDGE__*` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::concurrency::ExceptionPolicy;
use crate::error::KnowledgeError;
use crate::logging::LoggingConfig;
use crate::types::DEFAULT_PROPERTY_PREFIX;
use serde::{Deserialize, Serialize};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "COMPONENT_KNOWLEDGE";

fn default_node_id() -> String {
    "local-node".to_string()
}

fn default_property_prefix() -> String {
    DEFAULT_PROPERTY_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

/// Knowledge service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Identity of the local node
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Namespace prefix of component installation properties
    #[serde(default = "default_property_prefix")]
    pub property_prefix: String,

    /// Whether shared local installations are published (default: true)
    #[serde(default = "default_true")]
    pub publication_enabled: bool,

    /// Log every parsed property and snapshot change at debug level
    #[serde(default)]
    pub verbose_logging: bool,

    /// Handling of listeners whose callback panics
    #[serde(default)]
    pub listener_exception_policy: ExceptionPolicy,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            property_prefix: default_property_prefix(),
            publication_enabled: default_true(),
            verbose_logging: false,
            listener_exception_policy: ExceptionPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl KnowledgeConfig {
    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), KnowledgeError> {
        if self.node_id.trim().is_empty() {
            return Err(KnowledgeError::ConfigError(
                "node_id cannot be empty".to_string(),
            ));
        }
        if self.property_prefix.is_empty() {
            return Err(KnowledgeError::ConfigError(
                "property_prefix cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
