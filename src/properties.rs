//! Node property distribution layer, as consumed and fed by the knowledge service

use crate::types::{NodeId, PropertyKey};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// One property announced by a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeProperty {
    pub node_id: NodeId,
    pub key: PropertyKey,
    /// Serialized value; `None` for removals
    pub value: Option<String>,
}

impl NodeProperty {
    pub fn new(node_id: NodeId, key: impl Into<PropertyKey>, value: impl Into<String>) -> Self {
        Self {
            node_id,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn removed(node_id: NodeId, key: impl Into<PropertyKey>) -> Self {
        Self {
            node_id,
            key: key.into(),
            value: None,
        }
    }
}

/// Property changes to push for the local node; `None` removes the key
pub type PropertyDelta = BTreeMap<PropertyKey, Option<String>>;

/// Outbound side of the property distribution layer
pub trait NodePropertiesService: Send + Sync {
    fn add_or_update_local_node_properties(&self, delta: PropertyDelta);
}

/// Property service that records every pushed delta
///
/// Used by the replay tool and tests to observe network traffic.
#[derive(Default)]
pub struct RecordingPropertiesService {
    inner: Mutex<RecordedState>,
}

#[derive(Default)]
struct RecordedState {
    deltas: Vec<PropertyDelta>,
    published: BTreeMap<PropertyKey, String>,
}

impl RecordingPropertiesService {
    pub fn new() -> Self {
        Self::default()
    }

    /// All deltas pushed so far, oldest first
    pub fn deltas(&self) -> Vec<PropertyDelta> {
        self.inner.lock().deltas.clone()
    }

    pub fn push_count(&self) -> usize {
        self.inner.lock().deltas.len()
    }

    /// Effective property state after applying all deltas
    pub fn published(&self) -> BTreeMap<PropertyKey, String> {
        self.inner.lock().published.clone()
    }
}

impl NodePropertiesService for RecordingPropertiesService {
    fn add_or_update_local_node_properties(&self, delta: PropertyDelta) {
        let mut state = self.inner.lock();
        for (key, value) in &delta {
            match value {
                Some(v) => {
                    state.published.insert(key.clone(), v.clone());
                }
                None => {
                    state.published.remove(key);
                }
            }
        }
        state.deltas.push(delta);
    }
}
