//! Tests for monitor builders

use office_monitor::builders::build_monitor;
use office_monitor::config::MonitorConfig;
use office_monitor::core::{EventKind, Role, Visitor};

#[test]
fn test_build_monitor_wires_event_log() {
    let handles = build_monitor(&MonitorConfig::default()).unwrap();
    let ta = Visitor::new(Role::Ta, "TA-01");
    handles.monitor.enter(&ta).unwrap();
    handles.monitor.exit(&ta).unwrap();

    let kinds: Vec<EventKind> = handles.event_log.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Admitted, EventKind::Released]);
}

#[test]
fn test_build_monitor_with_disabled_log() {
    let cfg = MonitorConfig {
        event_log_capacity: 0,
        trace_events: true,
    };
    let handles = build_monitor(&cfg).unwrap();
    let s = Visitor::new(Role::Student, "S-01");
    handles.monitor.enter(&s).unwrap();
    handles.monitor.exit(&s).unwrap();
    assert!(handles.event_log.is_empty());
}

#[test]
fn test_build_monitor_rejects_invalid_config() {
    let cfg = MonitorConfig {
        event_log_capacity: usize::MAX,
        trace_events: false,
    };
    let err = build_monitor(&cfg).unwrap_err();
    assert!(err.to_string().contains("config invalid"));
}
