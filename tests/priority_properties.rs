//! Stress tests for the office monitor invariants
//!
//! Many threads hammer one monitor; the event stream and an occupancy
//! counter are then checked for mutual exclusion, TA priority, FIFO order
//! within a role, and eventual admission of everyone.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use office_monitor::core::{EventKind, OfficeEvent, OfficeMonitor, Role, Visitor, VisitorId};

const VISITS_PER_THREAD: usize = 20;

fn run_crowd(ta_threads: usize, student_threads: usize) -> (Vec<OfficeEvent>, usize) {
    let monitor = Arc::new(OfficeMonitor::new());
    let (_, events) = monitor.subscribe_channel();
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(ta_threads + student_threads));

    let roles = std::iter::repeat(Role::Ta)
        .take(ta_threads)
        .chain(std::iter::repeat(Role::Student).take(student_threads));
    let handles: Vec<_> = roles
        .enumerate()
        .map(|(i, role)| {
            let monitor = Arc::clone(&monitor);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for visit in 0..VISITS_PER_THREAD {
                    let visitor = Visitor::new(role, format!("{}-{i}-{visit}", role.name_prefix()));
                    monitor.enter(&visitor).unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_micros(50));
                    inside.fetch_sub(1, Ordering::SeqCst);
                    monitor.exit(&visitor).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(monitor.snapshot().is_idle());
    (events.try_iter().collect(), max_inside.load(Ordering::SeqCst))
}

/// Never more than one visitor inside.
#[test]
fn test_mutual_exclusion_under_contention() {
    let (events, max_inside) = run_crowd(3, 6);
    assert_eq!(max_inside, 1);

    let mut occupied = false;
    for event in &events {
        match event.kind {
            EventKind::Admitted => {
                assert!(!occupied, "admitted into an occupied office: {event:?}");
                occupied = true;
            }
            EventKind::Released => {
                assert!(occupied, "released an empty office: {event:?}");
                occupied = false;
            }
            EventKind::Queued | EventKind::Withdrawn => {}
        }
    }
    assert!(!occupied);
}

/// Events carry strictly increasing sequence numbers.
#[test]
fn test_events_are_totally_ordered() {
    let (events, _) = run_crowd(2, 4);
    assert!(!events.is_empty());
    assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
    assert_eq!(events[0].seq, 1);
}

/// A student is never admitted while a TA waits.
#[test]
fn test_no_student_admitted_while_ta_waits() {
    let (events, _) = run_crowd(4, 4);
    for event in events
        .iter()
        .filter(|e| e.kind == EventKind::Admitted && e.role == Role::Student)
    {
        assert_eq!(event.ta_waiting, 0, "student admitted past a waiting TA: {event:?}");
    }
}

/// Every queued visitor is admitted, and queued visitors of one role are
/// admitted in the order they queued.
#[test]
fn test_queued_visitors_admitted_fifo_per_role() {
    let (events, _) = run_crowd(3, 5);

    let admissions = events.iter().filter(|e| e.kind == EventKind::Admitted).count();
    assert_eq!(admissions, 8 * VISITS_PER_THREAD);

    for role in Role::ALL {
        let queued: Vec<VisitorId> = events
            .iter()
            .filter(|e| e.kind == EventKind::Queued && e.role == role)
            .map(|e| e.visitor)
            .collect();
        let admitted_at: HashMap<VisitorId, u64> = events
            .iter()
            .filter(|e| e.kind == EventKind::Admitted && e.role == role)
            .map(|e| (e.visitor, e.seq))
            .collect();

        let order: Vec<u64> = queued.iter().map(|id| admitted_at[id]).collect();
        assert!(
            order.windows(2).all(|w| w[0] < w[1]),
            "{role} queue not served in arrival order"
        );
    }
}

/// Short timeouts racing with wakes never leave the office idle with
/// requests still queued.
#[test]
fn test_timeouts_never_lose_wakes() {
    let monitor = Arc::new(OfficeMonitor::new());
    let admitted = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(10));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let monitor = Arc::clone(&monitor);
            let admitted = Arc::clone(&admitted);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let role = if i % 2 == 0 { Role::Ta } else { Role::Student };
                barrier.wait();
                for visit in 0..VISITS_PER_THREAD {
                    let visitor = Visitor::new(role, format!("{}-{i}-{visit}", role.name_prefix()));
                    let entered = if visit % 2 == 0 {
                        monitor.enter_timeout(&visitor, Duration::from_micros(200)).unwrap()
                    } else {
                        monitor.enter(&visitor).unwrap();
                        true
                    };
                    if entered {
                        admitted.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(50));
                        monitor.exit(&visitor).unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(monitor.snapshot().is_idle());
    assert!(admitted.load(Ordering::SeqCst) >= 10 * VISITS_PER_THREAD / 2);
}
