//! Error types for the component knowledge layer.

use crate::types::NodeId;
use thiserror::Error;

/// Top-level error for configuration, logging setup and scenario replay.
///
/// Event processing inside the knowledge service never returns these to
/// snapshot readers; malformed input is logged and dropped instead.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging setup failed: {0}")]
    LoggingError(String),

    #[error("Scenario error: {0}")]
    ScenarioError(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for KnowledgeError {
    fn from(err: config::ConfigError) -> Self {
        KnowledgeError::ConfigError(err.to_string())
    }
}

/// Failure to encode or decode a component announcement.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed announcement envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Malformed component descriptor: {0}")]
    Descriptor(#[source] serde_json::Error),

    #[error("Failed to serialize component descriptor: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Structural inconsistency in a decoded, accessible announcement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("published by node {publisher}, but allegedly installed on node {declared}")]
    OriginMismatch { publisher: NodeId, declared: String },

    #[error("'null' component revision")]
    MissingRevision,

    #[error("'null' component interface")]
    MissingInterface,

    #[error("'null' component interface id")]
    MissingIdentifier,
}

/// Reason an incoming announcement was not applied.
#[derive(Error, Debug)]
pub enum RejectReason {
    #[error(transparent)]
    Decode(#[from] CodecError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
