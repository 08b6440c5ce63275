//! Component Knowledge: distributed view of installed components
//!
//! Merges local component installations and remote node-property announcements
//! into immutable, point-in-time snapshots, re-evaluates remote knowledge when
//! local authorization changes, and publishes minimal property deltas for the
//! local node's shared installations.

pub mod authorization;
pub mod concurrency;
pub mod config;
pub mod entry;
pub mod error;
pub mod format;
pub mod knowledge;
pub mod logging;
pub mod properties;
pub mod scenario;
pub mod types;
