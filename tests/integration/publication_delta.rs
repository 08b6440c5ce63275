//! Only changed serialized forms are pushed to the property layer.

use super::common::{harness, local_entry, LOCAL};
use component_knowledge::authorization::{AccessGroup, PermissionSet};
use component_knowledge::entry::{ComponentEntry, ComponentInstallation};

#[test]
fn same_installations_twice_push_once() {
    let h = harness();
    let entries = vec![
        local_entry("a", PermissionSet::public()),
        local_entry("b", PermissionSet::from_groups([AccessGroup::new("team")])),
        local_entry("c", PermissionSet::local_only()),
    ];
    h.service.set_local_installations(entries.clone(), true);
    h.service.set_local_installations(entries, true);

    let deltas = h.properties.deltas();
    assert_eq!(deltas.len(), 1);
    let keys: Vec<&str> = deltas[0].keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["componentInstallation/a", "componentInstallation/b"]
    );
}

#[test]
fn changed_and_vanished_entries_form_minimal_delta() {
    let h = harness();
    h.service.set_local_installations(
        vec![
            local_entry("a", PermissionSet::public()),
            local_entry("b", PermissionSet::public()),
        ],
        true,
    );

    let upgraded = ComponentInstallation::new("a", LOCAL, "a/2.0", "a");
    h.service.set_local_installations(
        vec![ComponentEntry::local(upgraded, PermissionSet::public(), true).unwrap()],
        true,
    );

    let deltas = h.properties.deltas();
    assert_eq!(deltas.len(), 2);
    let second = &deltas[1];
    assert_eq!(second.len(), 2);
    assert!(second["componentInstallation/a"].is_some());
    assert_eq!(second["componentInstallation/b"], None);
    assert_eq!(h.properties.published().len(), 1);
}

#[test]
fn forced_local_entries_are_never_published() {
    let h = harness();
    let installation = ComponentInstallation::new("a", LOCAL, "a/1.0", "a");
    let entry = ComponentEntry::local(installation, PermissionSet::public(), false).unwrap();
    h.service.set_local_installations(vec![entry], true);

    assert_eq!(h.properties.push_count(), 0);
    let snapshot = h.service.current_snapshot();
    assert_eq!(snapshot.local_only_installations().len(), 1);
    assert!(snapshot.shared_installations().is_empty());
}
