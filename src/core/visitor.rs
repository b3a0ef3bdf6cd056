//! Visitor identity and roles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifier of a visitor. Unique per process when allocated by [`Visitor::new`].
pub type VisitorId = u64;

static NEXT_VISITOR_ID: AtomicU64 = AtomicU64::new(1);

/// The class a visitor belongs to.
///
/// TAs outrank students: no student enters while a TA waits or is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Teaching assistant (high priority).
    Ta,
    /// Student (low priority).
    Student,
}

impl Role {
    /// Both roles, highest priority first.
    pub const ALL: [Self; 2] = [Self::Ta, Self::Student];

    /// Returns true if `self` is served strictly before `other`.
    #[must_use]
    pub const fn outranks(self, other: Self) -> bool {
        matches!((self, other), (Self::Ta, Self::Student))
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ta => "TA",
            Self::Student => "Student",
        }
    }

    /// Prefix used when naming simulated visitors (`TA-01`, `S-01`).
    #[must_use]
    pub const fn name_prefix(self) -> &'static str {
        match self {
            Self::Ta => "TA",
            Self::Student => "S",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A caller contending for the office.
///
/// The monitor tracks visitors by [`VisitorId`], so a visitor may hold at
/// most one pending or active occupancy at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Visitor {
    id: VisitorId,
    role: Role,
    name: String,
}

impl Visitor {
    /// Create a visitor with a freshly allocated id.
    pub fn new(role: Role, name: impl Into<String>) -> Self {
        Self::with_id(NEXT_VISITOR_ID.fetch_add(1, Ordering::Relaxed), role, name)
    }

    /// Create a visitor with a caller-chosen id.
    ///
    /// The caller is responsible for keeping ids unique among visitors that
    /// share a monitor.
    pub fn with_id(id: VisitorId, role: Role, name: impl Into<String>) -> Self {
        Self {
            id,
            role,
            name: name.into(),
        }
    }

    /// Visitor id.
    #[must_use]
    pub const fn id(&self) -> VisitorId {
        self.id
    }

    /// Visitor role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Visitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ta_outranks_student_only() {
        assert!(Role::Ta.outranks(Role::Student));
        assert!(!Role::Student.outranks(Role::Ta));
        assert!(!Role::Ta.outranks(Role::Ta));
        assert!(!Role::Student.outranks(Role::Student));
    }

    #[test]
    fn test_visitor_ids_are_unique() {
        let a = Visitor::new(Role::Ta, "TA-01");
        let b = Visitor::new(Role::Ta, "TA-01");
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_visitor_display() {
        let v = Visitor::with_id(7, Role::Student, "S-03");
        assert_eq!(v.to_string(), "Student S-03");
        assert_eq!(v.id(), 7);
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Ta).unwrap(), "\"ta\"");
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
    }
}
