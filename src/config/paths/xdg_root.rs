//! XDG Base Directory utilities for configuration lookup.

use crate::error::KnowledgeError;
use std::path::PathBuf;

/// Directory name used under the XDG config home
pub const APP_DIR: &str = "component-knowledge";

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
pub fn config_home() -> Result<PathBuf, KnowledgeError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        KnowledgeError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// Path of the global configuration file
///
/// Returns `$XDG_CONFIG_HOME/component-knowledge/config.toml`. The file may not exist.
pub fn global_config_file() -> Result<PathBuf, KnowledgeError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}
