//! Core identifier types for the component knowledge layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// NodeId: identity of a participating node (instance session id string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId::new(id)
    }
}

/// ComponentId: unique installation id of a component on its owning node
pub type ComponentId = String;

/// PropertyKey: node property key, `<prefix><component id>`
pub type PropertyKey = String;

/// Default namespace prefix for single component installation properties
pub const DEFAULT_PROPERTY_PREFIX: &str = "componentInstallation/";
