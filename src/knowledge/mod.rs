//! Knowledge layer: per-node knowledge, accessibility assessment, snapshots,
//! publication bookkeeping and the service tying them together.

pub mod access;
pub mod node;
pub mod publication;
pub mod service;
pub mod snapshot;

pub use node::PerNodeKnowledge;
pub use service::{KnowledgeListener, KnowledgeService};
pub use snapshot::{RemoteKnowledge, Snapshot, SnapshotSummary};
