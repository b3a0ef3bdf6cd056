//! Tests for office snapshots

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use office_monitor::core::{OfficeMonitor, OfficeSnapshot, Role, Visitor};

#[test]
fn test_idle_snapshot() {
    let snapshot = OfficeMonitor::new().snapshot();
    assert!(snapshot.is_idle());
    assert_eq!(snapshot.occupant_count(), 0);
    assert_eq!(snapshot.occupant_role(), None);
    assert_eq!(snapshot.last_event_seq, 0);
}

#[test]
fn test_snapshot_lists_queues_head_first() {
    let monitor = Arc::new(OfficeMonitor::new());
    let holder = Visitor::new(Role::Ta, "TA-01");
    monitor.enter(&holder).unwrap();

    let waiters: Vec<_> = ["S-01", "S-02"]
        .into_iter()
        .map(|name| {
            let m = Arc::clone(&monitor);
            let visitor = Visitor::new(Role::Student, name);
            let handle = thread::spawn(move || {
                m.enter(&visitor).unwrap();
                m.exit(&visitor).unwrap();
            });
            let deadline = Instant::now() + Duration::from_secs(5);
            while !monitor.snapshot().queued_names(Role::Student).contains(&name) {
                assert!(Instant::now() < deadline);
                thread::sleep(Duration::from_millis(1));
            }
            handle
        })
        .collect();

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.queued_names(Role::Student), vec!["S-01", "S-02"]);
    assert_eq!(snapshot.student_queue_roles(), vec![Role::Student, Role::Student]);
    assert!(snapshot.ta_queue_roles().is_empty());
    assert!(snapshot.queue(Role::Student)[0].arrival < snapshot.queue(Role::Student)[1].arrival);
    assert!(snapshot.student_queue.iter().all(|w| !w.woken));

    monitor.exit(&holder).unwrap();
    for handle in waiters {
        handle.join().unwrap();
    }
    assert!(monitor.snapshot().is_idle());
}

#[test]
fn test_snapshot_json_round_trip() {
    let monitor = OfficeMonitor::new();
    let ta = Visitor::new(Role::Ta, "TA-07");
    monitor.enter(&ta).unwrap();

    let snapshot = monitor.snapshot();
    let json = snapshot.to_json().unwrap();
    assert!(json.contains("\"role\":\"ta\""));
    let parsed: OfficeSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snapshot);
    assert_eq!(parsed.last_event_seq, 1);
}
