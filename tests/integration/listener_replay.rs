//! Listener registration: replay of the current snapshot, ordering, isolation.

use super::common::{announcement, harness, local_entry};
use component_knowledge::authorization::PermissionSet;
use component_knowledge::knowledge::Snapshot;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn counting_listener() -> (
    Arc<dyn component_knowledge::knowledge::KnowledgeListener>,
    mpsc::Receiver<usize>,
) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let listener = Arc::new(move |snapshot: &Arc<Snapshot>| {
        let _ = tx.lock().send(snapshot.all_local_installations().len());
    });
    (listener, rx)
}

#[test]
fn late_listener_gets_current_snapshot_then_new_ones() {
    let h = harness();
    for n in 1..=3 {
        let entries = (0..n)
            .map(|i| local_entry(&format!("c{}", i), PermissionSet::public()))
            .collect();
        h.service.set_local_installations(entries, true);
    }

    let (listener, rx) = counting_listener();
    h.service.add_listener(listener).unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 3);

    for n in 4..=6 {
        let entries = (0..n)
            .map(|i| local_entry(&format!("c{}", i), PermissionSet::public()))
            .collect();
        h.service.set_local_installations(entries, true);
    }
    let received: Vec<usize> = (0..3).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
    assert_eq!(received, vec![4, 5, 6]);
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn panicking_listener_does_not_block_others() {
    let h = harness();
    h.service
        .add_listener(Arc::new(|_: &Arc<Snapshot>| panic!("listener failure")))
        .unwrap();
    let (listener, rx) = counting_listener();
    h.service.add_listener(listener).unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 0);

    h.service.on_reachable_node_properties_changed(
        &[announcement("peer", "x", &PermissionSet::public())],
        &[],
        &[],
    );
    h.service
        .set_local_installations(vec![local_entry("a", PermissionSet::public())], true);

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 0);
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 1);
    assert_eq!(h.service.current_snapshot().all_installations().len(), 2);
}

#[test]
fn removed_listener_stops_receiving() {
    let h = harness();
    let (listener, rx) = counting_listener();
    let id = h.service.add_listener(listener).unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 0);

    assert!(h.service.remove_listener(id));
    assert!(!h.service.remove_listener(id));
    h.service
        .set_local_installations(vec![local_entry("a", PermissionSet::public())], true);
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}
