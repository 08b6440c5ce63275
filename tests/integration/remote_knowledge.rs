//! Remote property handling: namespace, self-announcements, removals, validation.

use super::common::{announcement, announcement_version, harness, remote_pairs, LOCAL, PREFIX};
use component_knowledge::authorization::{AccessGroup, PermissionSet};
use component_knowledge::properties::NodeProperty;
use component_knowledge::types::NodeId;
use std::sync::Arc;

#[test]
fn self_announcement_never_enters_remote_knowledge() {
    let h = harness();
    h.service.on_reachable_node_properties_changed(
        &[announcement(LOCAL, "a", &PermissionSet::public())],
        &[announcement(LOCAL, "b", &PermissionSet::public())],
        &[],
    );
    let snapshot = h.service.current_snapshot();
    assert!(snapshot.remote_knowledge().is_empty());
    assert!(snapshot.all_installations().is_empty());

    h.service.on_authorization_changed();
    assert!(h.service.current_snapshot().remote_knowledge().is_empty());
}

#[test]
fn announcements_from_several_nodes_are_merged() {
    let h = harness();
    h.service.on_reachable_node_properties_changed(
        &[
            announcement("n1", "x", &PermissionSet::public()),
            announcement("n2", "x", &PermissionSet::public()),
            announcement("n2", "y", &PermissionSet::public()),
        ],
        &[],
        &[],
    );
    let snapshot = h.service.current_snapshot();
    assert_eq!(
        remote_pairs(&snapshot),
        vec![
            ("n1".to_string(), "x".to_string()),
            ("n2".to_string(), "x".to_string()),
            ("n2".to_string(), "y".to_string()),
        ]
    );
    assert_eq!(snapshot.remote_installations().len(), 3);
}

#[test]
fn unchanged_batch_builds_no_snapshot() {
    let h = harness();
    let property = announcement("n1", "x", &PermissionSet::public());
    h.service
        .on_reachable_node_properties_changed(&[property.clone()], &[], &[]);
    let before = h.service.current_snapshot();

    h.service
        .on_reachable_node_properties_changed(&[], &[property], &[]);
    h.service.on_reachable_node_properties_changed(
        &[NodeProperty::new(NodeId::new("n1"), "otherNamespace/x", "{}")],
        &[],
        &[NodeProperty::removed(NodeId::new("n1"), format!("{}unknown", PREFIX))],
    );
    assert!(Arc::ptr_eq(&before, &h.service.current_snapshot()));
}

#[test]
fn update_replaces_entry() {
    let h = harness();
    h.service.on_reachable_node_properties_changed(
        &[announcement_version("n1", "x", "1.0", &PermissionSet::public())],
        &[],
        &[],
    );
    h.service.on_reachable_node_properties_changed(
        &[],
        &[announcement_version("n1", "x", "2.0", &PermissionSet::public())],
        &[],
    );
    let snapshot = h.service.current_snapshot();
    let entry = &snapshot.remote_installations()[0];
    assert_eq!(
        entry.payload().and_then(|p| p.identifier_and_version()),
        Some("x/2.0")
    );
}

#[test]
fn removal_of_inaccessible_entry_clears_node() {
    let h = harness();
    let hidden = PermissionSet::from_groups([AccessGroup::new("secret")]);
    h.service.on_reachable_node_properties_changed(
        &[announcement("n1", "x", &hidden)],
        &[],
        &[],
    );
    assert_eq!(h.service.current_snapshot().summary().remote_inaccessible, 1);

    h.service.on_reachable_node_properties_changed(
        &[],
        &[],
        &[NodeProperty::removed(NodeId::new("n1"), format!("{}x", PREFIX))],
    );
    assert!(h.service.current_snapshot().remote_knowledge().is_empty());
}

#[test]
fn local_only_remote_announcement_is_never_accessible() {
    let h = harness();
    h.service.on_reachable_node_properties_changed(
        &[announcement("n1", "x", &PermissionSet::local_only())],
        &[],
        &[],
    );
    let snapshot = h.service.current_snapshot();
    assert!(snapshot.remote_installations().is_empty());
    assert_eq!(
        snapshot
            .known_installations_on_node(&NodeId::new("n1"), true)
            .count(),
        1
    );
}

#[test]
fn malformed_added_then_valid_added_is_accepted() {
    let h = harness();
    h.service.on_reachable_node_properties_changed(
        &[NodeProperty::new(NodeId::new("n1"), format!("{}x", PREFIX), "{broken")],
        &[],
        &[],
    );
    assert!(h.service.current_snapshot().remote_knowledge().is_empty());

    h.service.on_reachable_node_properties_changed(
        &[announcement("n1", "x", &PermissionSet::public())],
        &[],
        &[],
    );
    let snapshot = h.service.current_snapshot();
    assert_eq!(remote_pairs(&snapshot), vec![("n1".to_string(), "x".to_string())]);

    h.service.on_authorization_changed();
    assert_eq!(h.service.current_snapshot().remote_installations().len(), 1);
}
