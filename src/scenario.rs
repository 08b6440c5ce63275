//! Scenario replay: drive an in-process knowledge service from a TOML description
//!
//! A scenario names the local node, its installations, the announcements
//! received from peers and a sequence of follow-up steps (group grants,
//! revocations, removals). Replaying it yields the final snapshot together with
//! everything the service pushed to the property layer.
//!
//! ```toml
//! node_id = "local"
//! groups = []
//!
//! [[local]]
//! id = "rce/Tool"
//! groups = ["public"]
//!
//! [[remote]]
//! node = "peer"
//! id = "rce/Tool"
//! groups = ["groupA"]
//!
//! [[steps]]
//! action = "join"
//! group = "groupA"
//! ```

use crate::authorization::{AccessGroup, PermissionSet, StaticAuthorization};
use crate::config::KnowledgeConfig;
use crate::entry::{encode_announcement, ComponentEntry, ComponentInstallation};
use crate::error::KnowledgeError;
use crate::knowledge::{KnowledgeService, Snapshot, SnapshotSummary};
use crate::properties::{NodeProperty, RecordingPropertiesService};
use crate::types::{NodeId, PropertyKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Overrides the configured local node id
    #[serde(default)]
    pub node_id: Option<String>,

    /// Overrides the configured publication flag
    #[serde(default)]
    pub publication_enabled: Option<bool>,

    /// Groups the local node belongs to before any step runs
    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub local: Vec<LocalInstallationSpec>,

    #[serde(default)]
    pub remote: Vec<RemoteAnnouncementSpec>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalInstallationSpec {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Defaults to `<id>/1.0`
    #[serde(default)]
    pub version: Option<String>,
    /// Empty means local only
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_publication: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteAnnouncementSpec {
    pub node: String,
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Node named inside the descriptor; defaults to `node`
    #[serde(default)]
    pub installed_on: Option<String>,
    /// Verbatim property value, bypassing encoding
    #[serde(default)]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Local node joins a group, then authorization is re-evaluated
    Join { group: String },
    /// Local node leaves a group, then authorization is re-evaluated
    Leave { group: String },
    /// A peer withdraws one announcement
    Remove { node: String, id: String },
    /// A peer announces or re-announces a component
    Announce(RemoteAnnouncementSpec),
}

fn default_true() -> bool {
    true
}

/// One row of the final component table
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallationRow {
    pub node: String,
    pub component_id: String,
    pub display_name: String,
    pub origin: String,
    pub permissions: String,
    pub accessible: bool,
}

/// Snapshot summary recorded after a replay phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRecord {
    pub phase: String,
    pub summary: SnapshotSummary,
}

/// Result of replaying a scenario
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub local_node: String,
    pub phases: Vec<PhaseRecord>,
    pub installations: Vec<InstallationRow>,
    pub published: BTreeMap<PropertyKey, String>,
    pub property_pushes: usize,
    #[serde(skip)]
    pub snapshot: Arc<Snapshot>,
}

impl Scenario {
    pub fn from_toml_str(source: &str) -> Result<Self, KnowledgeError> {
        toml::from_str(source)
            .map_err(|e| KnowledgeError::ScenarioError(format!("Invalid scenario: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self, KnowledgeError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            KnowledgeError::ScenarioError(format!(
                "Failed to read scenario {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&source)
    }

    /// Run the scenario against a fresh service built from `config`.
    pub fn replay(&self, config: &KnowledgeConfig) -> Result<ReplayReport, KnowledgeError> {
        let mut config = config.clone();
        if let Some(node_id) = &self.node_id {
            config.node_id = node_id.clone();
        }
        if let Some(enabled) = self.publication_enabled {
            config.publication_enabled = enabled;
        }

        let properties = Arc::new(RecordingPropertiesService::new());
        let authorization = Arc::new(StaticAuthorization::with_groups(
            self.groups.iter().map(AccessGroup::new),
        ));
        let service = KnowledgeService::new(&config, properties.clone(), authorization.clone())?;
        let local_node = service.local_node().clone();
        let mut phases = Vec::new();
        let mut record = |phase: String, service: &KnowledgeService| {
            let summary = service.current_snapshot().summary();
            info!(%phase, "{}", summary);
            phases.push(PhaseRecord { phase, summary });
        };

        let local = self
            .local
            .iter()
            .map(|spec| spec.to_entry(&local_node))
            .collect::<Result<Vec<_>, _>>()?;
        service.set_local_installations(local, config.publication_enabled);
        record("local installations".to_string(), &service);

        if !self.remote.is_empty() {
            let added = self
                .remote
                .iter()
                .map(|spec| spec.to_property(&config.property_prefix))
                .collect::<Result<Vec<_>, _>>()?;
            service.on_reachable_node_properties_changed(&added, &[], &[]);
            record("remote announcements".to_string(), &service);
        }

        for step in &self.steps {
            match step {
                Step::Join { group } => {
                    authorization.join(AccessGroup::new(group.as_str()));
                    service.on_authorization_changed();
                    record(format!("join {}", group), &service);
                }
                Step::Leave { group } => {
                    authorization.leave(&AccessGroup::new(group.as_str()));
                    service.on_authorization_changed();
                    record(format!("leave {}", group), &service);
                }
                Step::Remove { node, id } => {
                    let removed = NodeProperty::removed(
                        NodeId::new(node.as_str()),
                        format!("{}{}", config.property_prefix, id),
                    );
                    service.on_reachable_node_properties_changed(&[], &[], &[removed]);
                    record(format!("remove {} on {}", id, node), &service);
                }
                Step::Announce(spec) => {
                    let property = spec.to_property(&config.property_prefix)?;
                    service.on_reachable_node_properties_changed(&[], &[property], &[]);
                    record(format!("announce {} on {}", spec.id, spec.node), &service);
                }
            }
        }

        let snapshot = service.current_snapshot();
        Ok(ReplayReport {
            local_node: local_node.to_string(),
            phases,
            installations: installation_rows(&snapshot),
            published: properties.published(),
            property_pushes: properties.push_count(),
            snapshot,
        })
    }
}

impl LocalInstallationSpec {
    fn to_entry(&self, local_node: &NodeId) -> Result<ComponentEntry, KnowledgeError> {
        let installation = descriptor(
            &self.id,
            local_node.as_str(),
            self.version.as_deref(),
            self.display_name.as_deref(),
        );
        Ok(ComponentEntry::local(
            installation,
            permission_set(&self.groups),
            self.allow_publication,
        )?)
    }
}

impl RemoteAnnouncementSpec {
    fn to_property(&self, prefix: &str) -> Result<NodeProperty, KnowledgeError> {
        let value = match &self.raw {
            Some(raw) => raw.clone(),
            None => {
                let installed_on = self.installed_on.as_deref().unwrap_or(&self.node);
                let installation = descriptor(
                    &self.id,
                    installed_on,
                    self.version.as_deref(),
                    self.display_name.as_deref(),
                );
                encode_announcement(&installation, &permission_set(&self.groups))?
            }
        };
        Ok(NodeProperty::new(
            NodeId::new(self.node.as_str()),
            format!("{}{}", prefix, self.id),
            value,
        ))
    }
}

fn descriptor(
    id: &str,
    node: &str,
    version: Option<&str>,
    display_name: Option<&str>,
) -> ComponentInstallation {
    let version = version
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}/1.0", id));
    ComponentInstallation::new(id, node, version, display_name.unwrap_or(id))
}

fn permission_set(groups: &[String]) -> PermissionSet {
    PermissionSet::from_groups(groups.iter().map(AccessGroup::new))
}

/// Flatten a snapshot into table rows: local entries first, then every remote
/// node's accessible and inaccessible entries.
pub fn installation_rows(snapshot: &Snapshot) -> Vec<InstallationRow> {
    let owner = snapshot.owner().clone();
    let mut nodes = vec![owner];
    nodes.extend(snapshot.remote_nodes().cloned());

    let mut rows = Vec::new();
    for node in &nodes {
        let mut entries: Vec<_> = snapshot.known_installations_on_node(node, true).collect();
        entries.sort_by(|a, b| a.component_id().cmp(b.component_id()));
        for entry in entries {
            let accessible = *node == *snapshot.owner()
                || snapshot
                    .remote_knowledge()
                    .get(node)
                    .is_some_and(|k| k.is_accessible(entry.component_id()));
            rows.push(InstallationRow {
                node: node.to_string(),
                component_id: entry.component_id().to_string(),
                display_name: entry.display_name().to_string(),
                origin: format!("{:?}", entry.origin()),
                permissions: entry.declared_permissions().to_string(),
                accessible,
            });
        }
    }
    rows
}
