//! Per-node knowledge: accessible and inaccessible entries of one remote node

use crate::entry::ComponentEntry;
use crate::types::ComponentId;
use std::collections::HashMap;
use std::sync::Arc;

type EntryMap = HashMap<ComponentId, ComponentEntry>;

/// Immutable accessible/inaccessible partition of one node's entries
///
/// Mutators return a new value. Maps that a mutator does not touch are
/// shared with the original, and a touched map is only copied if some other
/// value (for example an already published snapshot) still holds it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerNodeKnowledge {
    accessible: Arc<EntryMap>,
    inaccessible: Arc<EntryMap>,
}

impl PerNodeKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_accessible_component(&self, id: &str, entry: ComponentEntry) -> Self {
        let mut next = self.clone();
        if next.inaccessible.contains_key(id) {
            Arc::make_mut(&mut next.inaccessible).remove(id);
        }
        Arc::make_mut(&mut next.accessible).insert(id.to_string(), entry);
        next
    }

    pub fn put_inaccessible_component(&self, id: &str, entry: ComponentEntry) -> Self {
        let mut next = self.clone();
        if next.accessible.contains_key(id) {
            Arc::make_mut(&mut next.accessible).remove(id);
        }
        Arc::make_mut(&mut next.inaccessible).insert(id.to_string(), entry);
        next
    }

    /// Remove an id from both partitions; unknown ids are a no-op
    pub fn remove_component(&self, id: &str) -> Self {
        let mut next = self.clone();
        if next.accessible.contains_key(id) {
            Arc::make_mut(&mut next.accessible).remove(id);
        }
        if next.inaccessible.contains_key(id) {
            Arc::make_mut(&mut next.inaccessible).remove(id);
        }
        next
    }

    pub fn is_accessible(&self, id: &str) -> bool {
        self.accessible.contains_key(id)
    }

    pub fn is_inaccessible(&self, id: &str) -> bool {
        self.inaccessible.contains_key(id)
    }

    /// Entry for `id` in either partition
    pub fn get(&self, id: &str) -> Option<&ComponentEntry> {
        self.accessible
            .get(id)
            .or_else(|| self.inaccessible.get(id))
    }

    pub fn accessible_components(&self) -> &HashMap<ComponentId, ComponentEntry> {
        &self.accessible
    }

    pub fn inaccessible_components(&self) -> &HashMap<ComponentId, ComponentEntry> {
        &self.inaccessible
    }

    pub fn len(&self) -> usize {
        self.accessible.len() + self.inaccessible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessible.is_empty() && self.inaccessible.is_empty()
    }
}
