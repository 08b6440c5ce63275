//! A snapshot handed out by the service never changes afterwards.

use super::common::{announcement, harness, local_entry};
use component_knowledge::authorization::{AccessGroup, PermissionSet};
use component_knowledge::entry::ComponentEntry;
use component_knowledge::properties::NodeProperty;
use component_knowledge::types::NodeId;
use std::sync::Arc;

fn ids(entries: &[ComponentEntry]) -> Vec<String> {
    entries.iter().map(|e| e.component_id().to_string()).collect()
}

#[test]
fn held_snapshot_survives_every_event_class() {
    let h = harness();
    h.service
        .set_local_installations(vec![local_entry("a", PermissionSet::public())], true);
    h.service.on_reachable_node_properties_changed(
        &[announcement("peer", "x", &PermissionSet::public())],
        &[],
        &[],
    );

    let held = h.service.current_snapshot();
    let held_all = ids(held.all_installations());
    let held_summary = held.summary();

    h.service.set_local_installations(
        vec![
            local_entry("a", PermissionSet::public()),
            local_entry("b", PermissionSet::local_only()),
        ],
        true,
    );
    h.service.on_reachable_node_properties_changed(
        &[announcement("peer2", "y", &PermissionSet::from_groups([AccessGroup::new("g")]))],
        &[],
        &[NodeProperty::removed(NodeId::new("peer"), "componentInstallation/x")],
    );
    h.authorization.join(AccessGroup::new("g"));
    h.service.on_authorization_changed();

    assert_eq!(ids(held.all_installations()), held_all);
    assert_eq!(held.summary(), held_summary);

    let latest = h.service.current_snapshot();
    assert!(!Arc::ptr_eq(&held, &latest));
    assert_eq!(ids(latest.all_installations()), vec!["a", "b", "y"]);
}

#[test]
fn concurrent_readers_see_complete_snapshots() {
    let h = Arc::new(harness());
    let writer = {
        let h = Arc::clone(&h);
        std::thread::spawn(move || {
            for round in 0..200 {
                let entries: Vec<_> = (0..=round % 5)
                    .map(|i| local_entry(&format!("c{}", i), PermissionSet::public()))
                    .collect();
                h.service.set_local_installations(entries, true);
            }
        })
    };

    for _ in 0..1000 {
        let snapshot = h.service.current_snapshot();
        assert_eq!(
            snapshot.all_local_installations().len(),
            snapshot.local_only_installations().len() + snapshot.shared_installations().len()
        );
    }
    writer.join().unwrap();
}
