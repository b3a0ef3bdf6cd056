//! Tests for the thread-based simulator

use std::time::Duration;

use office_monitor::config::{DurationRange, SimulationConfig};
use office_monitor::core::{EventKind, Role};
use office_monitor::runtime::Simulator;

fn fast_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        consult: DurationRange::from_millis(1, 4),
        arrival_interval: DurationRange::from_millis(1, 3),
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}

#[test]
fn test_simulator_rejects_invalid_config() {
    let cfg = SimulationConfig {
        ta_share: 2.0,
        ..SimulationConfig::default()
    };
    assert!(Simulator::new(cfg).is_err());
}

#[test]
fn test_manual_visitors_all_complete() {
    office_monitor::util::init_tracing();
    let sim = Simulator::new(fast_config(1)).unwrap();
    for role in [Role::Student, Role::Ta, Role::Student, Role::Ta] {
        sim.add_visitor(role).unwrap();
    }
    let reports = sim.wait_idle();
    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|r| r.is_ok()));
    assert!(sim.snapshot().is_idle());
    assert_eq!(sim.event_log().events_of(EventKind::Admitted).len(), 4);
}

#[test]
fn test_auto_arrivals_stop_cleanly() {
    let sim = Simulator::new(fast_config(2)).unwrap();
    assert!(sim.start_auto().unwrap());
    std::thread::sleep(Duration::from_millis(40));
    sim.stop_auto();
    assert!(!sim.is_auto_running());

    let reports = sim.wait_idle();
    assert!(!reports.is_empty());
    assert!(reports.iter().all(|r| r.is_ok()));
    assert!(sim.snapshot().is_idle());

    // restartable
    assert!(sim.start_auto().unwrap());
    sim.stop_auto();
    sim.wait_idle();
}

#[test]
fn test_all_students_when_ta_share_is_zero() {
    let cfg = SimulationConfig {
        ta_share: 0.0,
        ..fast_config(3)
    };
    let sim = Simulator::new(cfg).unwrap();
    sim.start_auto().unwrap();
    std::thread::sleep(Duration::from_millis(30));
    sim.stop_auto();
    let reports = sim.wait_idle();
    assert!(reports.iter().all(|r| r.visitor.role() == Role::Student));
    assert!(reports.iter().all(|r| r.visitor.name().starts_with("S-")));
}
