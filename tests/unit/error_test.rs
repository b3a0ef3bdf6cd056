//! Tests for error types

use office_monitor::core::{MonitorError, Role, Violation};

#[test]
fn test_violation_messages() {
    assert_eq!(Violation::OfficeEmpty.to_string(), "the office is empty");
    assert_eq!(
        Violation::HeldByOther { holder: 7 }.to_string(),
        "the office is held by visitor 7"
    );
    assert_eq!(
        Violation::RoleMismatch {
            held: Role::Ta,
            claimed: Role::Student
        }
        .to_string(),
        "occupant entered as TA but left as Student"
    );
}

#[test]
fn test_protocol_violation_display_names_the_caller() {
    let err = MonitorError::ProtocolViolation {
        visitor: 3,
        role: Role::Student,
        reason: Violation::AlreadyInside,
    };
    let msg = err.to_string();
    assert!(msg.contains("Student visitor 3"));
    assert!(msg.contains("already inside"));
    assert_eq!(err.reason(), Violation::AlreadyInside);
}

#[test]
fn test_monitor_error_converts_to_anyhow() {
    let err = MonitorError::ProtocolViolation {
        visitor: 1,
        role: Role::Ta,
        reason: Violation::OfficeEmpty,
    };
    let app: anyhow::Error = err.clone().into();
    assert_eq!(app.downcast_ref::<MonitorError>(), Some(&err));
}
