//! Authorization groups and permission sets
//!
//! The knowledge layer only needs one question answered by the authorization
//! service: does the observing node's current group membership intersect a
//! declared permission set? Group management and key material live elsewhere.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Id of the built-in group every node in the local network belongs to
pub const PUBLIC_GROUP_ID: &str = "public";

/// Named authorization group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessGroup(String);

impl AccessGroup {
    pub fn new(id: impl Into<String>) -> Self {
        AccessGroup(id.into())
    }

    pub fn public() -> Self {
        AccessGroup(PUBLIC_GROUP_ID.to_string())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn is_public(&self) -> bool {
        self.0 == PUBLIC_GROUP_ID
    }
}

impl fmt::Display for AccessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of groups allowed to access a component
///
/// The empty set means "local only": the component is never published and,
/// if a remote node announces one anyway, it is never accessible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    groups: BTreeSet<AccessGroup>,
}

impl PermissionSet {
    pub fn local_only() -> Self {
        Self::default()
    }

    pub fn public() -> Self {
        Self::from_groups([AccessGroup::public()])
    }

    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = AccessGroup>,
    {
        Self {
            groups: groups.into_iter().collect(),
        }
    }

    pub fn is_local_only(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn is_public(&self) -> bool {
        self.groups.iter().any(AccessGroup::is_public)
    }

    pub fn groups(&self) -> impl Iterator<Item = &AccessGroup> {
        self.groups.iter()
    }

    /// Groups of this set that are also in `accessible`. The public group
    /// always matches.
    pub fn matching_groups(&self, accessible: &BTreeSet<AccessGroup>) -> PermissionSet {
        PermissionSet {
            groups: self
                .groups
                .iter()
                .filter(|g| g.is_public() || accessible.contains(*g))
                .cloned()
                .collect(),
        }
    }

    /// Whether a node in `accessible` groups may see a component declaring this set
    pub fn is_accessible_to(&self, accessible: &BTreeSet<AccessGroup>) -> bool {
        !self.matching_groups(accessible).is_local_only()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local_only() {
            return f.write_str("local");
        }
        let ids: Vec<&str> = self.groups.iter().map(AccessGroup::id).collect();
        f.write_str(&ids.join(","))
    }
}

/// Authorization collaborator as seen from the knowledge layer
pub trait AuthorizationService: Send + Sync {
    /// Groups the local node is currently a member of (excluding the
    /// implicit public group).
    fn accessible_groups(&self) -> BTreeSet<AccessGroup>;

    /// Whether the local node may see a component declaring `declared`
    fn is_accessible(&self, declared: &PermissionSet) -> bool {
        declared.is_accessible_to(&self.accessible_groups())
    }
}

/// In-memory authorization state with mutable group membership
///
/// Callers that change membership are responsible for triggering
/// `KnowledgeService::on_authorization_changed` afterwards.
#[derive(Default)]
pub struct StaticAuthorization {
    groups: RwLock<BTreeSet<AccessGroup>>,
}

impl StaticAuthorization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = AccessGroup>,
    {
        Self {
            groups: RwLock::new(groups.into_iter().collect()),
        }
    }

    /// Join a group; returns false if already a member
    pub fn join(&self, group: AccessGroup) -> bool {
        self.groups.write().insert(group)
    }

    /// Leave a group; returns false if not a member
    pub fn leave(&self, group: &AccessGroup) -> bool {
        self.groups.write().remove(group)
    }
}

impl AuthorizationService for StaticAuthorization {
    fn accessible_groups(&self) -> BTreeSet<AccessGroup> {
        self.groups.read().clone()
    }
}
