//! Knowledge service: owns the current snapshot and processes local, remote and
//! authorization events.
//!
//! Writers serialize on one internal model lock; readers load the current
//! snapshot through an [`ArcSwap`] without locking. Listener callbacks are
//! enqueued while the model lock is held, so every listener observes snapshots
//! in production order.

use crate::authorization::{AccessGroup, AuthorizationService};
use crate::concurrency::{Callback, ListenerId, OrderedCallbackManager};
use crate::config::KnowledgeConfig;
use crate::entry::ComponentEntry;
use crate::error::{KnowledgeError, RejectReason};
use crate::knowledge::access::{assess, Assessment, RemoteAnnouncement};
use crate::knowledge::node::PerNodeKnowledge;
use crate::knowledge::publication::PublicationLedger;
use crate::knowledge::snapshot::{RemoteKnowledge, Snapshot};
use crate::properties::{NodeProperty, NodePropertiesService};
use crate::types::{NodeId, PropertyKey};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Receives every new snapshot, starting with the one current at registration.
pub trait KnowledgeListener: Send + Sync + 'static {
    fn on_knowledge_changed(&self, snapshot: &Arc<Snapshot>);
}

impl<F> KnowledgeListener for F
where
    F: Fn(&Arc<Snapshot>) + Send + Sync + 'static,
{
    fn on_knowledge_changed(&self, snapshot: &Arc<Snapshot>) {
        self(snapshot)
    }
}

/// How a property reached the update path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateKind {
    Added,
    Updated,
    /// Re-run after an authorization change; not a network event
    Reevaluated,
}

impl UpdateKind {
    fn is_genuine(self) -> bool {
        !matches!(self, UpdateKind::Reevaluated)
    }
}

/// State guarded by the writer lock
#[derive(Default)]
struct InternalModel {
    /// Staging copy of per-node knowledge used to build the next snapshot
    remote: RemoteKnowledge,
    /// Raw values the network has told us, per node and property key
    received: HashMap<NodeId, BTreeMap<PropertyKey, String>>,
}

pub struct KnowledgeService {
    local_node: NodeId,
    prefix: String,
    verbose: bool,
    current: ArcSwap<Snapshot>,
    model: Mutex<InternalModel>,
    // lock order: publication, then model
    publication: Mutex<PublicationLedger>,
    listeners: OrderedCallbackManager<dyn KnowledgeListener>,
    properties: Arc<dyn NodePropertiesService>,
    authorization: Arc<dyn AuthorizationService>,
}

impl KnowledgeService {
    /// Create the service with an empty placeholder snapshot.
    ///
    /// With `verbose_logging` enabled an internal listener logs a summary of
    /// every snapshot at debug level.
    pub fn new(
        config: &KnowledgeConfig,
        properties: Arc<dyn NodePropertiesService>,
        authorization: Arc<dyn AuthorizationService>,
    ) -> Result<Self, KnowledgeError> {
        config.validate()?;
        let local_node = NodeId::new(config.node_id.clone());
        let service = Self {
            current: ArcSwap::from_pointee(Snapshot::empty(local_node.clone())),
            local_node,
            prefix: config.property_prefix.clone(),
            verbose: config.verbose_logging,
            model: Mutex::new(InternalModel::default()),
            publication: Mutex::new(PublicationLedger::new(config.property_prefix.clone())),
            listeners: OrderedCallbackManager::new(config.listener_exception_policy),
            properties,
            authorization,
        };

        if service.verbose {
            service.add_listener(Arc::new(|snapshot: &Arc<Snapshot>| {
                debug!(
                    owner = %snapshot.owner(),
                    "Component knowledge changed: {}",
                    snapshot.summary()
                );
            }))?;
        }

        Ok(service)
    }

    pub fn local_node(&self) -> &NodeId {
        &self.local_node
    }

    /// The latest snapshot. Never blocks and never observes a partial update.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Register a listener; it immediately receives the current snapshot.
    pub fn add_listener(
        &self,
        listener: Arc<dyn KnowledgeListener>,
    ) -> Result<ListenerId, KnowledgeError> {
        // holding the model lock keeps the initial callback ahead of any later swap
        let _model = self.model.lock();
        let current = self.current.load_full();
        self.listeners
            .add_listener_and_enqueue(listener, notification(current))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove_listener(id)
    }

    /// Replace the full set of local installations and publish the shared ones.
    ///
    /// Only keys whose serialized form changed since the last push are sent;
    /// keys no longer shared are sent as removals.
    pub fn set_local_installations(
        &self,
        installations: Vec<ComponentEntry>,
        publication_enabled: bool,
    ) {
        let mut ledger = self.publication.lock();
        let shared = {
            let _model = self.model.lock();
            let next = self
                .current
                .load()
                .with_new_local_installations(installations, publication_enabled);
            let shared = next.shared_installations().to_vec();
            self.swap(next);
            shared
        };

        let delta = ledger.update(&shared);
        if delta.is_empty() {
            debug!("Local component publication unchanged");
            return;
        }
        info!(
            changed = delta.len(),
            "Publishing component installation changes"
        );
        self.properties.add_or_update_local_node_properties(delta);
    }

    /// Process a batch of property events from reachable nodes.
    pub fn on_reachable_node_properties_changed(
        &self,
        added: &[NodeProperty],
        updated: &[NodeProperty],
        removed: &[NodeProperty],
    ) {
        let groups = self.authorization.accessible_groups();
        let mut model = self.model.lock();
        let mut modified = false;

        for property in added {
            modified |= self.process_update(&mut model, &groups, property, UpdateKind::Added);
        }
        for property in updated {
            modified |= self.process_update(&mut model, &groups, property, UpdateKind::Updated);
        }
        for property in removed {
            modified |= self.process_removal(&mut model, property);
        }

        if modified {
            self.rebuild_remote(&model);
        }
    }

    /// Re-run accessibility for every tracked remote property.
    ///
    /// The received-property ledger is read but never modified here.
    pub fn on_authorization_changed(&self) {
        let groups = self.authorization.accessible_groups();
        let mut model = self.model.lock();
        let tracked: Vec<NodeProperty> = model
            .received
            .iter()
            .flat_map(|(node, properties)| {
                properties
                    .iter()
                    .map(move |(key, value)| NodeProperty::new(node.clone(), key, value.clone()))
            })
            .collect();
        debug!(
            properties = tracked.len(),
            "Re-evaluating remote component knowledge after authorization change"
        );

        let mut modified = false;
        for property in &tracked {
            modified |=
                self.process_update(&mut model, &groups, property, UpdateKind::Reevaluated);
        }
        if modified {
            self.rebuild_remote(&model);
        }
    }

    fn component_id<'a>(&self, property: &'a NodeProperty) -> Option<&'a str> {
        if property.node_id == self.local_node {
            return None;
        }
        property
            .key
            .strip_prefix(self.prefix.as_str())
            .filter(|id| !id.is_empty())
    }

    fn process_update(
        &self,
        model: &mut InternalModel,
        groups: &BTreeSet<AccessGroup>,
        property: &NodeProperty,
        kind: UpdateKind,
    ) -> bool {
        let Some(component_id) = self.component_id(property) else {
            return false;
        };
        let Some(raw) = property.value.as_deref() else {
            return self.process_removal(model, property);
        };
        let node = &property.node_id;
        if self.verbose {
            debug!(node = %node, key = %property.key, ?kind, "Parsing component property");
        }

        let announcement = RemoteAnnouncement {
            publisher: node,
            component_id,
            raw,
        };
        let assessment = assess(announcement, groups);
        // undecodable values never replace what the network told us before
        let decodable = !matches!(assessment, Assessment::Rejected(RejectReason::Decode(_)));
        if kind.is_genuine() && decodable {
            record_received(model, property, raw, kind);
        }

        let current = model.remote.get(node).cloned().unwrap_or_default();
        let next = match assessment {
            Assessment::Accessible(entry) => {
                if current.is_accessible(component_id)
                    && current.get(component_id) == Some(&entry)
                {
                    return false;
                }
                if current.is_inaccessible(component_id) {
                    info!(
                        node = %node,
                        component = component_id,
                        "Component became accessible: {}",
                        entry.display_name()
                    );
                } else {
                    debug!(
                        node = %node,
                        component = component_id,
                        "Accessible component: {}",
                        entry.display_name()
                    );
                }
                current.put_accessible_component(component_id, entry)
            }
            Assessment::Inaccessible(entry) => {
                if current.is_inaccessible(component_id)
                    && current.get(component_id) == Some(&entry)
                {
                    return false;
                }
                if current.is_accessible(component_id) {
                    info!(
                        node = %node,
                        component = component_id,
                        "Component is no longer accessible"
                    );
                } else {
                    debug!(
                        node = %node,
                        component = component_id,
                        permissions = %entry.declared_permissions(),
                        "Parked inaccessible component"
                    );
                }
                current.put_inaccessible_component(component_id, entry)
            }
            Assessment::Rejected(RejectReason::Decode(e)) => {
                warn!(
                    node = %node,
                    key = %property.key,
                    "Ignoring unparseable component announcement: {}",
                    e
                );
                return false;
            }
            Assessment::Rejected(RejectReason::Invalid(e)) => {
                error!(
                    node = %node,
                    key = %property.key,
                    "Ignoring invalid component announcement: {}",
                    e
                );
                if current.get(component_id).is_none() {
                    return false;
                }
                current.remove_component(component_id)
            }
        };

        store_node_knowledge(&mut model.remote, node, next);
        true
    }

    fn process_removal(&self, model: &mut InternalModel, property: &NodeProperty) -> bool {
        let Some(component_id) = self.component_id(property) else {
            return false;
        };
        let node = &property.node_id;

        let known = model
            .received
            .get_mut(node)
            .and_then(|received| received.remove(&property.key))
            .is_some();
        if !known {
            warn!(
                node = %node,
                key = %property.key,
                "Received 'removed' event for unknown property"
            );
        }
        if model.received.get(node).is_some_and(BTreeMap::is_empty) {
            model.received.remove(node);
        }

        let Some(current) = model.remote.get(node) else {
            return false;
        };
        if current.get(component_id).is_none() {
            return false;
        }
        debug!(node = %node, component = component_id, "Removed component");
        let next = current.remove_component(component_id);
        store_node_knowledge(&mut model.remote, node, next);
        true
    }

    fn rebuild_remote(&self, model: &InternalModel) {
        let next = self
            .current
            .load()
            .with_new_remote_knowledge(model.remote.clone());
        self.swap(next);
    }

    /// Publish a new snapshot; caller holds the model lock.
    fn swap(&self, next: Snapshot) {
        let next = Arc::new(next);
        self.current.store(next.clone());
        self.listeners.enqueue(notification(next));
    }
}

fn notification(snapshot: Arc<Snapshot>) -> Callback<dyn KnowledgeListener> {
    Arc::new(move |listener: &(dyn KnowledgeListener + 'static)| {
        listener.on_knowledge_changed(&snapshot)
    })
}

/// Remember a genuine remote value, warning about events inconsistent with
/// what was received before.
fn record_received(model: &mut InternalModel, property: &NodeProperty, raw: &str, kind: UpdateKind) {
    let node = &property.node_id;
    let received = model.received.entry(node.clone()).or_default();
    let previous = received.insert(property.key.clone(), raw.to_string());
    match (kind, previous.is_some()) {
        (UpdateKind::Added, true) => warn!(
            node = %node,
            key = %property.key,
            "Received 'added' event for already known property"
        ),
        (UpdateKind::Updated, false) => warn!(
            node = %node,
            key = %property.key,
            "Received 'updated' event for unknown property"
        ),
        _ => {}
    }
}

fn store_node_knowledge(remote: &mut RemoteKnowledge, node: &NodeId, knowledge: PerNodeKnowledge) {
    if knowledge.is_empty() {
        remote.remove(node);
    } else {
        remote.insert(node.clone(), knowledge);
    }
}
