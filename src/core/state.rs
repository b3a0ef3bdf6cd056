//! Office state record and the admission rules applied under the monitor lock.
//!
//! Nothing here blocks or locks; [`MonitorState`] is plain data mutated by
//! `OfficeMonitor` while it holds its mutex.

use std::collections::VecDeque;
use std::sync::Arc;

use super::error::Violation;
use super::snapshot::{OccupantView, OfficeSnapshot, WaiterView};
use super::visitor::{Role, Visitor, VisitorId};
use crate::wait_handle::WaitHandle;

/// The visitor holding the office.
#[derive(Debug, Clone)]
pub(crate) struct Occupant {
    pub(crate) visitor: VisitorId,
    pub(crate) role: Role,
    pub(crate) name: String,
}

/// A queued occupancy attempt.
#[derive(Debug)]
pub(crate) struct Waiter {
    pub(crate) visitor: VisitorId,
    pub(crate) role: Role,
    pub(crate) name: String,
    pub(crate) arrival: u64,
    pub(crate) handle: Arc<WaitHandle>,
    /// A wake was delivered and not yet consumed by a re-check.
    pub(crate) woken: bool,
}

/// Where a visitor currently is, as far as the monitor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Presence {
    Inside,
    Waiting,
}

/// The shared office record.
#[derive(Debug, Default)]
pub(crate) struct MonitorState {
    occupant: Option<Occupant>,
    ta_queue: VecDeque<Waiter>,
    student_queue: VecDeque<Waiter>,
    next_arrival: u64,
    last_event_seq: u64,
}

impl MonitorState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) const fn occupant(&self) -> Option<&Occupant> {
        self.occupant.as_ref()
    }

    pub(crate) const fn queue(&self, role: Role) -> &VecDeque<Waiter> {
        match role {
            Role::Ta => &self.ta_queue,
            Role::Student => &self.student_queue,
        }
    }

    fn queue_mut(&mut self, role: Role) -> &mut VecDeque<Waiter> {
        match role {
            Role::Ta => &mut self.ta_queue,
            Role::Student => &mut self.student_queue,
        }
    }

    fn position(&self, role: Role, arrival: u64) -> Option<usize> {
        self.queue(role).iter().position(|w| w.arrival == arrival)
    }

    /// Whether `visitor` is already inside or queued.
    pub(crate) fn presence(&self, visitor: VisitorId) -> Option<Presence> {
        if self.occupant.as_ref().is_some_and(|o| o.visitor == visitor) {
            return Some(Presence::Inside);
        }
        let queued = self
            .ta_queue
            .iter()
            .chain(self.student_queue.iter())
            .any(|w| w.visitor == visitor);
        queued.then_some(Presence::Waiting)
    }

    /// Admission predicate for a newly arriving request.
    ///
    /// Blocked by an occupant, or by anyone waiting with a role that
    /// outranks `role`. A TA is therefore blocked only by an occupant.
    pub(crate) fn admits_arrival(&self, role: Role) -> bool {
        self.occupant.is_none()
            && !Role::ALL
                .into_iter()
                .any(|other| other.outranks(role) && !self.queue(other).is_empty())
    }

    /// Admission predicate for a queued request after a wake.
    ///
    /// Same as [`MonitorState::admits_arrival`], and the request must also be
    /// the head of its queue.
    pub(crate) fn admits_waiter(&self, role: Role, arrival: u64) -> bool {
        self.admits_arrival(role)
            && self.queue(role).front().is_some_and(|w| w.arrival == arrival)
    }

    pub(crate) fn is_queued(&self, role: Role, arrival: u64) -> bool {
        self.position(role, arrival).is_some()
    }

    /// Commit occupancy. The office must be empty.
    pub(crate) fn occupy(&mut self, visitor: &Visitor) {
        debug_assert!(self.occupant.is_none(), "office already occupied");
        self.occupant = Some(Occupant {
            visitor: visitor.id(),
            role: visitor.role(),
            name: visitor.name().to_owned(),
        });
    }

    /// Append a request to the tail of its role's queue and return its arrival sequence.
    pub(crate) fn enqueue(&mut self, visitor: &Visitor, handle: Arc<WaitHandle>) -> u64 {
        self.next_arrival += 1;
        let arrival = self.next_arrival;
        self.queue_mut(visitor.role()).push_back(Waiter {
            visitor: visitor.id(),
            role: visitor.role(),
            name: visitor.name().to_owned(),
            arrival,
            handle,
            woken: false,
        });
        arrival
    }

    /// Unlink a request from its queue, wherever it sits.
    pub(crate) fn take_waiter(&mut self, role: Role, arrival: u64) -> Option<Waiter> {
        let index = self.position(role, arrival)?;
        self.queue_mut(role).remove(index)
    }

    /// Mark a wake as consumed after a failed re-check. The request keeps its position.
    pub(crate) fn settle(&mut self, role: Role, arrival: u64) {
        if let Some(index) = self.position(role, arrival) {
            if let Some(waiter) = self.queue_mut(role).get_mut(index) {
                waiter.woken = false;
            }
        }
    }

    /// Release the office on behalf of `visitor`.
    ///
    /// Leaves the state untouched on error.
    pub(crate) fn vacate(&mut self, visitor: VisitorId, role: Role) -> Result<Occupant, Violation> {
        let Some(current) = &self.occupant else {
            return Err(Violation::OfficeEmpty);
        };
        if current.visitor != visitor {
            return Err(Violation::HeldByOther {
                holder: current.visitor,
            });
        }
        if current.role != role {
            return Err(Violation::RoleMismatch {
                held: current.role,
                claimed: role,
            });
        }
        self.occupant
            .take()
            .ok_or(Violation::Inconsistent("occupant vanished"))
    }

    /// Pick the next request to wake: head of the TA queue, else head of the
    /// student queue. Only applies while the office is empty.
    ///
    /// Marks the chosen request as woken; the caller delivers the wake.
    pub(crate) fn signal_next(&mut self) -> Option<&Waiter> {
        if self.occupant.is_some() {
            return None;
        }
        let role = Role::ALL
            .into_iter()
            .find(|role| !self.queue(*role).is_empty())?;
        let head = self.queue_mut(role).front_mut()?;
        head.woken = true;
        Some(head)
    }

    pub(crate) fn next_event_seq(&mut self) -> u64 {
        self.last_event_seq += 1;
        self.last_event_seq
    }

    pub(crate) fn snapshot(&self) -> OfficeSnapshot {
        let view = |w: &Waiter| WaiterView {
            visitor: w.visitor,
            role: w.role,
            name: w.name.clone(),
            arrival: w.arrival,
            woken: w.woken,
        };
        OfficeSnapshot {
            occupant: self.occupant.as_ref().map(|o| OccupantView {
                visitor: o.visitor,
                role: o.role,
                name: o.name.clone(),
            }),
            ta_queue: self.ta_queue.iter().map(view).collect(),
            student_queue: self.student_queue.iter().map(view).collect(),
            last_event_seq: self.last_event_seq,
        }
    }

    /// Verify the structural invariants of the record.
    ///
    /// Holds whenever the monitor lock is released.
    pub(crate) fn check_invariants(&self) -> Result<(), Violation> {
        for role in Role::ALL {
            let queue = self.queue(role);
            if queue.iter().any(|w| w.role != role) {
                return Err(Violation::Inconsistent("request queued under the wrong role"));
            }
            if queue.iter().zip(queue.iter().skip(1)).any(|(a, b)| a.arrival >= b.arrival) {
                return Err(Violation::Inconsistent("queue out of arrival order"));
            }
        }

        let mut ids: Vec<VisitorId> = self
            .ta_queue
            .iter()
            .chain(self.student_queue.iter())
            .map(|w| w.visitor)
            .chain(self.occupant.iter().map(|o| o.visitor))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != total {
            return Err(Violation::Inconsistent("visitor present in two places"));
        }

        if self.occupant.is_none() {
            let head = Role::ALL
                .into_iter()
                .find_map(|role| self.queue(role).front());
            if head.is_some_and(|w| !w.woken) {
                return Err(Violation::Inconsistent("office idle while a request waits unsignalled"));
            }
        }
        Ok(())
    }
}
