//! Built-in defaults that every merged configuration starts from.

use crate::types::DEFAULT_PROPERTY_PREFIX;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the defaults that other sources override.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("property_prefix", DEFAULT_PROPERTY_PREFIX)?
        .set_default("publication_enabled", true)?
        .set_default("verbose_logging", false)
}
