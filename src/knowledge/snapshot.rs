//! Immutable point-in-time view of all known component installations
//!
//! Snapshots are never mutated. Each update derives a new snapshot from the
//! previous one; collections not affected by the update are shared.

use crate::entry::ComponentEntry;
use crate::knowledge::node::PerNodeKnowledge;
use crate::types::NodeId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Remote knowledge of all nodes, ordered by node id
pub type RemoteKnowledge = BTreeMap<NodeId, PerNodeKnowledge>;

/// Immutable aggregate of local and remote component knowledge
#[derive(Debug, Clone)]
pub struct Snapshot {
    owner: NodeId,
    all_local: Arc<[ComponentEntry]>,
    local_access: Arc<[ComponentEntry]>,
    shared_access: Arc<[ComponentEntry]>,
    remote_entries: Arc<[ComponentEntry]>,
    remote_knowledge: Arc<RemoteKnowledge>,
    all_installations: Arc<[ComponentEntry]>,
}

/// Entry counts of a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub local_only: usize,
    pub shared: usize,
    pub remote_accessible: usize,
    pub remote_inaccessible: usize,
    pub remote_nodes: usize,
}

impl Snapshot {
    /// Placeholder used until the first update
    pub fn empty(owner: NodeId) -> Self {
        let empty: Arc<[ComponentEntry]> = Arc::from(Vec::new());
        Self {
            owner,
            all_local: empty.clone(),
            local_access: empty.clone(),
            shared_access: empty.clone(),
            remote_entries: empty.clone(),
            remote_knowledge: Arc::new(RemoteKnowledge::new()),
            all_installations: empty,
        }
    }

    /// Derive a snapshot with a new set of local installations
    ///
    /// Shared entries go to the shared partition only while publication is
    /// enabled; otherwise they are demoted to the local-only partition.
    pub fn with_new_local_installations(
        &self,
        all_local: Vec<ComponentEntry>,
        publication_enabled: bool,
    ) -> Snapshot {
        let (shared, local): (Vec<_>, Vec<_>) = all_local
            .iter()
            .cloned()
            .partition(|e| publication_enabled && e.origin().is_shared());
        let all_local: Arc<[ComponentEntry]> = Arc::from(all_local);
        let all_installations = flatten_all(&all_local, &self.remote_entries);
        Snapshot {
            owner: self.owner.clone(),
            all_local,
            local_access: Arc::from(local),
            shared_access: Arc::from(shared),
            remote_entries: self.remote_entries.clone(),
            remote_knowledge: self.remote_knowledge.clone(),
            all_installations,
        }
    }

    /// Derive a snapshot with new remote knowledge
    pub fn with_new_remote_knowledge(&self, remote_knowledge: RemoteKnowledge) -> Snapshot {
        let mut remote = Vec::new();
        for knowledge in remote_knowledge.values() {
            let mut entries: Vec<&ComponentEntry> =
                knowledge.accessible_components().values().collect();
            entries.sort_by(|a, b| a.component_id().cmp(b.component_id()));
            remote.extend(entries.into_iter().cloned());
        }
        let remote_entries: Arc<[ComponentEntry]> = Arc::from(remote);
        let all_installations = flatten_all(&self.all_local, &remote_entries);
        Snapshot {
            owner: self.owner.clone(),
            all_local: self.all_local.clone(),
            local_access: self.local_access.clone(),
            shared_access: self.shared_access.clone(),
            remote_entries,
            remote_knowledge: Arc::new(remote_knowledge),
            all_installations,
        }
    }

    pub fn owner(&self) -> &NodeId {
        &self.owner
    }

    /// All local entries plus all accessible remote entries
    pub fn all_installations(&self) -> &[ComponentEntry] {
        &self.all_installations
    }

    pub fn all_local_installations(&self) -> &[ComponentEntry] {
        &self.all_local
    }

    pub fn local_only_installations(&self) -> &[ComponentEntry] {
        &self.local_access
    }

    pub fn shared_installations(&self) -> &[ComponentEntry] {
        &self.shared_access
    }

    /// Accessible entries of all remote nodes
    pub fn remote_installations(&self) -> &[ComponentEntry] {
        &self.remote_entries
    }

    pub fn remote_knowledge(&self) -> &RemoteKnowledge {
        &self.remote_knowledge
    }

    pub fn remote_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.remote_knowledge.keys()
    }

    /// Entries known for one node
    ///
    /// For the owner this is the local installations. For remote nodes the
    /// inaccessible partition is only included on request (diagnostics).
    pub fn known_installations_on_node<'a>(
        &'a self,
        node: &NodeId,
        include_inaccessible: bool,
    ) -> impl Iterator<Item = &'a ComponentEntry> + 'a {
        let local: &'a [ComponentEntry] = if *node == self.owner {
            &self.all_local
        } else {
            &[]
        };
        let knowledge = self.remote_knowledge.get(node);
        let accessible = knowledge
            .into_iter()
            .flat_map(|k| k.accessible_components().values());
        let inaccessible = knowledge
            .filter(|_| include_inaccessible)
            .into_iter()
            .flat_map(|k| k.inaccessible_components().values());
        local.iter().chain(accessible).chain(inaccessible)
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            local_only: self.local_access.len(),
            shared: self.shared_access.len(),
            remote_accessible: self.remote_entries.len(),
            remote_inaccessible: self
                .remote_knowledge
                .values()
                .map(|k| k.inaccessible_components().len())
                .sum(),
            remote_nodes: self.remote_knowledge.len(),
        }
    }
}

impl fmt::Display for SnapshotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "local-only: {}, shared: {}, remote: {} accessible / {} inaccessible on {} node(s)",
            self.local_only,
            self.shared,
            self.remote_accessible,
            self.remote_inaccessible,
            self.remote_nodes
        )
    }
}

fn flatten_all(local: &[ComponentEntry], remote: &[ComponentEntry]) -> Arc<[ComponentEntry]> {
    local.iter().chain(remote.iter()).cloned().collect()
}
