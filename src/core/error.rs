//! Error types for monitor operations.

use thiserror::Error;

use super::visitor::{Role, VisitorId};

/// The specific way a caller broke the `enter`/`exit` pairing contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    /// `enter` called by a visitor that already occupies the office.
    #[error("visitor is already inside the office")]
    AlreadyInside,
    /// `enter` called by a visitor that is already queued.
    #[error("visitor is already waiting to enter")]
    AlreadyWaiting,
    /// `exit` called while nobody occupies the office.
    #[error("the office is empty")]
    OfficeEmpty,
    /// `exit` called while a different visitor occupies the office.
    #[error("the office is held by visitor {holder}")]
    HeldByOther {
        /// Id of the actual occupant.
        holder: VisitorId,
    },
    /// `exit` called with the occupant's id but a different role.
    #[error("occupant entered as {held} but left as {claimed}")]
    RoleMismatch {
        /// Role recorded at admission.
        held: Role,
        /// Role presented at exit.
        claimed: Role,
    },
    /// A suspended request vanished from its queue.
    #[error("request #{arrival} is missing from the {role} queue")]
    LostRequest {
        /// Queue the request was placed in.
        role: Role,
        /// Arrival sequence of the request.
        arrival: u64,
    },
    /// Internal bookkeeping broke an invariant.
    #[error("monitor state is inconsistent: {0}")]
    Inconsistent(&'static str),
}

/// Errors produced by the office monitor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// The caller misused the monitor; always a caller bug.
    #[error("protocol violation by {role} visitor {visitor}: {reason}")]
    ProtocolViolation {
        /// Visitor that made the offending call.
        visitor: VisitorId,
        /// Role presented by that visitor.
        role: Role,
        /// What went wrong.
        reason: Violation,
    },
}

impl MonitorError {
    /// The underlying violation.
    #[must_use]
    pub const fn reason(&self) -> Violation {
        match self {
            Self::ProtocolViolation { reason, .. } => *reason,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
