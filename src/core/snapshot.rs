//! Read-only views of the monitor state for presentation layers.

use serde::{Deserialize, Serialize};

use super::visitor::{Role, VisitorId};

/// The visitor currently inside the office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantView {
    /// Visitor id.
    pub visitor: VisitorId,
    /// Role the visitor entered with.
    pub role: Role,
    /// Display name.
    pub name: String,
}

/// A queued request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiterView {
    /// Visitor id.
    pub visitor: VisitorId,
    /// Role of the waiting visitor.
    pub role: Role,
    /// Display name.
    pub name: String,
    /// Arrival sequence assigned when the request was queued.
    pub arrival: u64,
    /// A wake was delivered and the request has not re-checked yet.
    pub woken: bool,
}

/// Atomic snapshot of the office, taken under the monitor lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeSnapshot {
    /// Current occupant, if any.
    pub occupant: Option<OccupantView>,
    /// Waiting TAs, head first.
    pub ta_queue: Vec<WaiterView>,
    /// Waiting students, head first.
    pub student_queue: Vec<WaiterView>,
    /// Sequence number of the last event published before the snapshot.
    pub last_event_seq: u64,
}

impl OfficeSnapshot {
    /// Role of the occupant, if any.
    #[must_use]
    pub fn occupant_role(&self) -> Option<Role> {
        self.occupant.as_ref().map(|o| o.role)
    }

    /// Number of occupants (0 or 1).
    #[must_use]
    pub const fn occupant_count(&self) -> usize {
        if self.occupant.is_some() {
            1
        } else {
            0
        }
    }

    /// Number of waiting TAs.
    #[must_use]
    pub fn ta_queue_len(&self) -> usize {
        self.ta_queue.len()
    }

    /// Number of waiting students.
    #[must_use]
    pub fn student_queue_len(&self) -> usize {
        self.student_queue.len()
    }

    /// Roles in the TA queue, head first.
    #[must_use]
    pub fn ta_queue_roles(&self) -> Vec<Role> {
        self.ta_queue.iter().map(|w| w.role).collect()
    }

    /// Roles in the student queue, head first.
    #[must_use]
    pub fn student_queue_roles(&self) -> Vec<Role> {
        self.student_queue.iter().map(|w| w.role).collect()
    }

    /// Waiters of the given role, head first.
    #[must_use]
    pub fn queue(&self, role: Role) -> &[WaiterView] {
        match role {
            Role::Ta => &self.ta_queue,
            Role::Student => &self.student_queue,
        }
    }

    /// Names of the waiters of the given role, head first.
    #[must_use]
    pub fn queued_names(&self, role: Role) -> Vec<&str> {
        self.queue(role).iter().map(|w| w.name.as_str()).collect()
    }

    /// Nobody inside and nobody waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.occupant.is_none() && self.ta_queue.is_empty() && self.student_queue.is_empty()
    }

    /// Serialize to JSON for rendering.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which cannot occur for well-formed snapshots.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
