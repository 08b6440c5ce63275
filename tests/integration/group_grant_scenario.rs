//! Parked remote entries become visible after a local group grant, without
//! any new network traffic.

use super::common::{announcement, harness, local_entry, LOCAL};
use component_knowledge::authorization::{AccessGroup, PermissionSet};
use component_knowledge::entry::OriginType;
use component_knowledge::types::NodeId;

fn tool_owners(snapshot: &component_knowledge::knowledge::Snapshot) -> Vec<(String, OriginType)> {
    snapshot
        .all_installations()
        .iter()
        .filter(|e| e.component_id() == "rce/Tool")
        .map(|e| {
            let owner = e
                .payload()
                .map(|p| p.node_id.clone())
                .unwrap_or_default();
            (owner, e.origin())
        })
        .collect()
}

#[test]
fn peer_tool_appears_after_joining_group() {
    let h = harness();
    h.service
        .set_local_installations(vec![local_entry("rce/Tool", PermissionSet::public())], true);
    let pushes_after_publication = h.properties.push_count();
    assert_eq!(pushes_after_publication, 1);

    let group_a = PermissionSet::from_groups([AccessGroup::new("groupA")]);
    h.service.on_reachable_node_properties_changed(
        &[announcement("peer", "rce/Tool", &group_a)],
        &[],
        &[],
    );

    let before = h.service.current_snapshot();
    assert_eq!(
        tool_owners(&before),
        vec![(LOCAL.to_string(), OriginType::Shared)]
    );
    let peer = NodeId::new("peer");
    assert_eq!(before.known_installations_on_node(&peer, false).count(), 0);
    assert_eq!(before.known_installations_on_node(&peer, true).count(), 1);

    h.authorization.join(AccessGroup::new("groupA"));
    h.service.on_authorization_changed();

    let after = h.service.current_snapshot();
    assert_eq!(
        tool_owners(&after),
        vec![
            (LOCAL.to_string(), OriginType::Shared),
            ("peer".to_string(), OriginType::Remote),
        ]
    );
    assert_eq!(h.properties.push_count(), pushes_after_publication);

    // the earlier snapshot is untouched
    assert_eq!(tool_owners(&before).len(), 1);
}

#[test]
fn unrelated_grant_changes_nothing() {
    let h = harness();
    let group_a = PermissionSet::from_groups([AccessGroup::new("groupA")]);
    h.service.on_reachable_node_properties_changed(
        &[announcement("peer", "rce/Tool", &group_a)],
        &[],
        &[],
    );
    let before = h.service.current_snapshot();

    h.authorization.join(AccessGroup::new("groupB"));
    h.service.on_authorization_changed();

    let after = h.service.current_snapshot();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    assert!(after.remote_installations().is_empty());
}

#[test]
fn removal_after_regrant_is_still_honored() {
    let h = harness();
    let group_a = PermissionSet::from_groups([AccessGroup::new("groupA")]);
    let property = announcement("peer", "rce/Tool", &group_a);
    h.service
        .on_reachable_node_properties_changed(&[property.clone()], &[], &[]);

    h.authorization.join(AccessGroup::new("groupA"));
    h.service.on_authorization_changed();
    h.service.on_authorization_changed();
    assert_eq!(h.service.current_snapshot().remote_installations().len(), 1);

    h.service.on_reachable_node_properties_changed(
        &[],
        &[],
        &[component_knowledge::properties::NodeProperty::removed(
            property.node_id.clone(),
            property.key.clone(),
        )],
    );
    let snapshot = h.service.current_snapshot();
    assert!(snapshot.remote_installations().is_empty());

    // nothing left to re-evaluate
    h.service.on_authorization_changed();
    assert!(h.service.current_snapshot().remote_knowledge().is_empty());
}

#[test]
fn malformed_update_does_not_block_promotion() {
    let h = harness();
    let group_a = PermissionSet::from_groups([AccessGroup::new("groupA")]);
    let property = announcement("peer", "rce/Tool", &group_a);
    h.service
        .on_reachable_node_properties_changed(&[property.clone()], &[], &[]);

    let garbage = component_knowledge::properties::NodeProperty::new(
        property.node_id.clone(),
        property.key.clone(),
        "not json",
    );
    h.service
        .on_reachable_node_properties_changed(&[], &[garbage], &[]);
    assert_eq!(h.service.current_snapshot().summary().remote_inaccessible, 1);

    h.authorization.join(AccessGroup::new("groupA"));
    h.service.on_authorization_changed();

    let snapshot = h.service.current_snapshot();
    assert_eq!(snapshot.remote_installations().len(), 1);
    assert_eq!(snapshot.summary().remote_inaccessible, 0);
}

#[test]
fn spoofed_parked_entry_stays_absent_after_grant() {
    use component_knowledge::entry::{encode_announcement, ComponentInstallation};

    let h = harness();
    let group_a = PermissionSet::from_groups([AccessGroup::new("groupA")]);
    let installation = ComponentInstallation::new("rce/Tool", "elsewhere", "rce/Tool/1.0", "Tool");
    let spoofed = component_knowledge::properties::NodeProperty::new(
        NodeId::new("peer"),
        "componentInstallation/rce/Tool",
        encode_announcement(&installation, &group_a).unwrap(),
    );
    h.service
        .on_reachable_node_properties_changed(&[spoofed], &[], &[]);
    let peer = NodeId::new("peer");
    assert_eq!(
        h.service
            .current_snapshot()
            .known_installations_on_node(&peer, true)
            .count(),
        1
    );

    h.authorization.join(AccessGroup::new("groupA"));
    h.service.on_authorization_changed();

    let snapshot = h.service.current_snapshot();
    assert!(snapshot.remote_installations().is_empty());
    assert_eq!(snapshot.known_installations_on_node(&peer, true).count(), 0);
}
