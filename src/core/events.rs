//! Office events and observer implementations.
//!
//! The monitor publishes one [`OfficeEvent`] per state transition, in
//! sequence order, while it still holds its lock. Observers therefore see a
//! consistent ordering but must return quickly and must not call back into
//! the monitor.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::visitor::{Role, VisitorId};

/// Identifier returned by `OfficeMonitor::subscribe`.
pub type SubscriptionId = u64;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A request joined the tail of its queue.
    Queued,
    /// A visitor took the office.
    Admitted,
    /// The occupant left the office.
    Released,
    /// A queued request gave up (timeout or cancellation).
    Withdrawn,
}

/// A state transition, with enough context to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeEvent {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,
    /// Transition kind.
    pub kind: EventKind,
    /// Visitor concerned.
    pub visitor: VisitorId,
    /// Role of that visitor.
    pub role: Role,
    /// Display name of that visitor.
    pub name: String,
    /// Waiting TAs after the transition.
    pub ta_waiting: usize,
    /// Waiting students after the transition.
    pub students_waiting: usize,
    /// Whether the office is occupied after the transition.
    pub occupied: bool,
    /// Timestamp milliseconds.
    pub at_ms: u128,
}

/// Receives office events.
pub trait OfficeObserver: Send + Sync {
    /// Called once per transition, with the monitor lock held.
    fn on_event(&self, event: &OfficeEvent);
}

impl<F> OfficeObserver for F
where
    F: Fn(&OfficeEvent) + Send + Sync,
{
    fn on_event(&self, event: &OfficeEvent) {
        self(event);
    }
}

/// Bounded in-memory event log for presentation layers and tests.
#[derive(Debug)]
pub struct EventLog {
    events: Mutex<VecDeque<OfficeEvent>>,
    max_events: usize,
}

impl EventLog {
    /// Create a log keeping at most `max_events` recent events.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<OfficeEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events of one kind, oldest first.
    pub fn events_of(&self, kind: EventKind) -> Vec<OfficeEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Names of admitted visitors in admission order.
    pub fn admission_order(&self) -> Vec<String> {
        self.events_of(EventKind::Admitted)
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drop all stored events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl OfficeObserver for EventLog {
    fn on_event(&self, event: &OfficeEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// Emits every event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl OfficeObserver for TracingObserver {
    fn on_event(&self, event: &OfficeEvent) {
        tracing::info!(
            seq = event.seq,
            kind = ?event.kind,
            visitor = event.visitor,
            role = %event.role,
            name = %event.name,
            ta_waiting = event.ta_waiting,
            students_waiting = event.students_waiting,
            occupied = event.occupied,
            "office event"
        );
    }
}

/// Forwards events into an unbounded crossbeam channel.
///
/// Sending never blocks, so it is safe to use under the monitor lock.
/// Events are dropped silently once the receiver is gone.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: crossbeam_channel::Sender<OfficeEvent>,
}

#[cfg(not(target_arch = "wasm32"))]
impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    pub fn new() -> (Self, crossbeam_channel::Receiver<OfficeEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl OfficeObserver for ChannelObserver {
    fn on_event(&self, event: &OfficeEvent) {
        let _ = self.tx.send(event.clone());
    }
}
