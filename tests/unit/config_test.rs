//! Tests for configuration validation and loading

use std::collections::HashMap;

use office_monitor::config::{DurationRange, MonitorConfig, SimulationConfig};

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_match_demo_timings() {
    let cfg = SimulationConfig::default();
    assert_eq!(cfg.consult, DurationRange::from_millis(1500, 3000));
    assert_eq!(cfg.arrival_interval, DurationRange::from_millis(800, 1800));
    assert!((cfg.ta_share - 0.35).abs() < f64::EPSILON);
    assert_eq!(cfg.monitor.event_log_capacity, 256);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_inverted_range_is_invalid() {
    let cfg = SimulationConfig {
        consult: DurationRange::from_millis(10, 5),
        ..SimulationConfig::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("consult"));
}

#[test]
fn test_ta_share_out_of_bounds_is_invalid() {
    let cfg = SimulationConfig {
        ta_share: 1.5,
        ..SimulationConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_oversized_event_log_is_invalid() {
    let cfg = MonitorConfig {
        event_log_capacity: 2_000_000,
        trace_events: false,
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_str_fills_defaults() {
    let cfg = SimulationConfig::from_json_str(r#"{"ta_share": 0.5, "seed": 9}"#).unwrap();
    assert!((cfg.ta_share - 0.5).abs() < f64::EPSILON);
    assert_eq!(cfg.seed, Some(9));
    assert_eq!(cfg.consult, SimulationConfig::default().consult);
}

#[test]
fn test_from_json_str_rejects_bad_input() {
    assert!(SimulationConfig::from_json_str("not json").is_err());
    assert!(SimulationConfig::from_json_str(r#"{"ta_share": -0.1}"#).is_err());
}

#[test]
fn test_from_vars_overrides() {
    let cfg = SimulationConfig::from_vars(vars(&[
        ("OFFICE_CONSULT_MIN_MS", "10"),
        ("OFFICE_CONSULT_MAX_MS", "20"),
        ("OFFICE_TA_SHARE", "0.9"),
        ("OFFICE_SEED", "42"),
        ("OFFICE_TRACE_EVENTS", "true"),
    ]))
    .unwrap();
    assert_eq!(cfg.consult, DurationRange::from_millis(10, 20));
    assert_eq!(cfg.seed, Some(42));
    assert!(cfg.monitor.trace_events);
}

#[test]
fn test_from_vars_reports_bad_values() {
    let err = SimulationConfig::from_vars(vars(&[("OFFICE_SEED", "abc")])).unwrap_err();
    assert!(err.to_string().contains("OFFICE_SEED"));

    let err = SimulationConfig::from_vars(vars(&[("OFFICE_TA_SHARE", "2")])).unwrap_err();
    assert!(err.to_string().contains("config invalid"));
}
