//! Shared fixtures: a service wired to recording collaborators.

use component_knowledge::authorization::{PermissionSet, StaticAuthorization};
use component_knowledge::config::KnowledgeConfig;
use component_knowledge::entry::{encode_announcement, ComponentEntry, ComponentInstallation};
use component_knowledge::knowledge::{KnowledgeService, Snapshot};
use component_knowledge::properties::{NodeProperty, RecordingPropertiesService};
use component_knowledge::types::NodeId;
use std::sync::Arc;

pub const LOCAL: &str = "local-node";
pub const PREFIX: &str = "componentInstallation/";

pub struct Harness {
    pub service: KnowledgeService,
    pub properties: Arc<RecordingPropertiesService>,
    pub authorization: Arc<StaticAuthorization>,
}

pub fn harness() -> Harness {
    let config = KnowledgeConfig {
        node_id: LOCAL.to_string(),
        ..KnowledgeConfig::default()
    };
    let properties = Arc::new(RecordingPropertiesService::new());
    let authorization = Arc::new(StaticAuthorization::new());
    let service = KnowledgeService::new(&config, properties.clone(), authorization.clone())
        .expect("service construction");
    Harness {
        service,
        properties,
        authorization,
    }
}

pub fn local_entry(id: &str, permissions: PermissionSet) -> ComponentEntry {
    let installation = ComponentInstallation::new(id, LOCAL, format!("{}/1.0", id), id);
    ComponentEntry::local(installation, permissions, true).expect("encode local entry")
}

pub fn announcement(node: &str, id: &str, permissions: &PermissionSet) -> NodeProperty {
    announcement_version(node, id, "1.0", permissions)
}

pub fn announcement_version(
    node: &str,
    id: &str,
    version: &str,
    permissions: &PermissionSet,
) -> NodeProperty {
    let installation = ComponentInstallation::new(id, node, format!("{}/{}", id, version), id);
    let raw = encode_announcement(&installation, permissions).expect("encode announcement");
    NodeProperty::new(NodeId::new(node), format!("{}{}", PREFIX, id), raw)
}

/// (node, component id) pairs of all remote accessible installations
pub fn remote_pairs(snapshot: &Snapshot) -> Vec<(String, String)> {
    snapshot
        .remote_knowledge()
        .iter()
        .flat_map(|(node, knowledge)| {
            let mut ids: Vec<_> = knowledge.accessible_components().keys().cloned().collect();
            ids.sort();
            ids.into_iter().map(move |id| (node.to_string(), id))
        })
        .collect()
}
