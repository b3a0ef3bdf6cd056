//! The office priority monitor.
//!
//! One mutex guards the office state. Each suspended request owns its own
//! wait handle, so `exit` wakes exactly the request it selected: the head of
//! the TA queue, or failing that the head of the student queue. The woken
//! request re-checks its admission predicate under the lock before taking the
//! office (Mesa semantics); if it lost a race it goes back to sleep in the same
//! queue position.
//!
//! # Examples
//!
//! ```
//! use office_monitor::core::{OfficeMonitor, Role, Visitor};
//!
//! let monitor = OfficeMonitor::new();
//! let student = Visitor::new(Role::Student, "S-01");
//!
//! monitor.enter(&student).unwrap();
//! assert_eq!(monitor.snapshot().occupant_role(), Some(Role::Student));
//! monitor.exit(&student).unwrap();
//! assert!(monitor.snapshot().is_idle());
//! ```
//!
//! Scoped visits leave the office on drop:
//!
//! ```
//! use office_monitor::core::{OfficeMonitor, Role, Visitor};
//!
//! let monitor = OfficeMonitor::new();
//! let ta = Visitor::new(Role::Ta, "TA-01");
//! {
//!     let _visit = monitor.visit(&ta).unwrap();
//!     assert_eq!(monitor.snapshot().occupant_count(), 1);
//! }
//! assert_eq!(monitor.snapshot().occupant_count(), 0);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard, RwLock};

use super::error::{MonitorError, Violation};
use super::events::{EventKind, OfficeEvent, OfficeObserver, SubscriptionId};
use super::snapshot::OfficeSnapshot;
use super::state::{MonitorState, Presence};
use super::visitor::{Role, Visitor, VisitorId};
use crate::util::clock::now_ms;
use crate::wait_handle::WaitHandle;

type Subscriber = (SubscriptionId, Arc<dyn OfficeObserver>);

/// Exclusive office shared by TAs and students, TAs first.
pub struct OfficeMonitor {
    state: Mutex<MonitorState>,
    observers: RwLock<Vec<Subscriber>>,
    next_subscription: AtomicU64,
}

impl Default for OfficeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OfficeMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfficeMonitor")
            .field("state", &self.snapshot())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}

impl OfficeMonitor {
    /// Create an empty office with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MonitorState::new()),
            observers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Enter the office, blocking until admitted.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the visitor is already inside or already waiting.
    pub fn enter(&self, visitor: &Visitor) -> Result<(), MonitorError> {
        self.enter_blocking(visitor, None).map(|_| ())
    }

    /// Enter the office, giving up after `timeout`.
    ///
    /// Returns `Ok(false)` if the wait expired; the request has then been
    /// removed from its queue.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the visitor is already inside or already waiting.
    pub fn enter_timeout(&self, visitor: &Visitor, timeout: Duration) -> Result<bool, MonitorError> {
        self.enter_until(visitor, Instant::now() + timeout)
    }

    /// Enter the office, giving up at `deadline`.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the visitor is already inside or already waiting.
    pub fn enter_until(&self, visitor: &Visitor, deadline: Instant) -> Result<bool, MonitorError> {
        self.enter_blocking(visitor, Some(deadline))
    }

    /// Enter only if the office would admit the visitor right now. Never queues.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the visitor is already inside or already waiting.
    pub fn try_enter(&self, visitor: &Visitor) -> Result<bool, MonitorError> {
        let mut state = self.state.lock();
        Self::ensure_absent(&state, visitor)?;
        if !state.admits_arrival(visitor.role()) {
            return Ok(false);
        }
        self.admit(&mut state, visitor);
        Ok(true)
    }

    /// Enter and return a guard that leaves the office when dropped.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the visitor is already inside or already waiting.
    pub fn visit<'a>(&'a self, visitor: &'a Visitor) -> Result<Visit<'a>, MonitorError> {
        self.enter(visitor)?;
        Ok(Visit {
            monitor: self,
            visitor,
            left: false,
        })
    }

    /// Leave the office and wake the next eligible waiter.
    ///
    /// The woken request still re-validates before it takes the office.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if `visitor` does not hold the office. The state is
    /// left unchanged in that case.
    pub fn exit(&self, visitor: &Visitor) -> Result<(), MonitorError> {
        let mut state = self.state.lock();
        let occupant = state
            .vacate(visitor.id(), visitor.role())
            .map_err(|reason| Self::violation(visitor, reason))?;
        tracing::info!(visitor = occupant.visitor, role = %occupant.role, name = %occupant.name, "left the office");
        Self::wake_next(&mut state);
        self.publish(&mut state, EventKind::Released, occupant.visitor, occupant.role, &occupant.name);
        Self::debug_check(&state);
        Ok(())
    }

    /// Atomic view of the office.
    pub fn snapshot(&self) -> OfficeSnapshot {
        self.state.lock().snapshot()
    }

    /// Register an observer for every subsequent transition.
    ///
    /// The next waiter is already woken when an observer sees `Released` or
    /// `Withdrawn`, so a panicking observer cannot strand the queues.
    pub fn subscribe<O>(&self, observer: O) -> SubscriptionId
    where
        O: OfficeObserver + 'static,
    {
        self.subscribe_shared(Arc::new(observer))
    }

    /// Register an observer the caller keeps a handle to.
    pub fn subscribe_shared(&self, observer: Arc<dyn OfficeObserver>) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.observers.write().push((id, observer));
        tracing::debug!(subscription = id, "observer subscribed");
        id
    }

    /// Subscribe through a channel; the receiver yields events in sequence order.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn subscribe_channel(&self) -> (SubscriptionId, crossbeam_channel::Receiver<OfficeEvent>) {
        let (observer, rx) = super::events::ChannelObserver::new();
        (self.subscribe(observer), rx)
    }

    /// Remove an observer. Returns false if the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    fn enter_blocking(&self, visitor: &Visitor, deadline: Option<Instant>) -> Result<bool, MonitorError> {
        let role = visitor.role();
        let mut state = self.state.lock();
        Self::ensure_absent(&state, visitor)?;
        if state.admits_arrival(role) {
            self.admit(&mut state, visitor);
            return Ok(true);
        }

        let handle = Arc::new(WaitHandle::for_thread());
        let arrival = self.queue_request(&mut state, visitor, Arc::clone(&handle));

        loop {
            let timed_out = match deadline {
                Some(deadline) => handle.wait_until(&mut state, deadline),
                None => {
                    handle.wait(&mut state);
                    false
                }
            };

            if self.recheck(&mut state, visitor, arrival)? {
                return Ok(true);
            }
            if timed_out {
                tracing::warn!(visitor = visitor.id(), role = %role, name = visitor.name(), "gave up waiting for the office");
                self.withdraw(&mut state, role, arrival);
                return Ok(false);
            }
        }
    }

    /// Re-validate a queued request after a wake.
    ///
    /// Returns true when the request was admitted, false when it must keep
    /// waiting in its current position.
    fn recheck(
        &self,
        state: &mut MutexGuard<'_, MonitorState>,
        visitor: &Visitor,
        arrival: u64,
    ) -> Result<bool, MonitorError> {
        let role = visitor.role();
        if !state.is_queued(role, arrival) {
            return Err(Self::violation(visitor, Violation::LostRequest { role, arrival }));
        }
        if state.admits_waiter(role, arrival) {
            state.take_waiter(role, arrival);
            self.admit(state, visitor);
            return Ok(true);
        }
        tracing::debug!(visitor = visitor.id(), role = %role, arrival, "re-check failed, waiting again");
        state.settle(role, arrival);
        Ok(false)
    }

    fn ensure_absent(state: &MonitorState, visitor: &Visitor) -> Result<(), MonitorError> {
        match state.presence(visitor.id()) {
            None => Ok(()),
            Some(Presence::Inside) => Err(Self::violation(visitor, Violation::AlreadyInside)),
            Some(Presence::Waiting) => Err(Self::violation(visitor, Violation::AlreadyWaiting)),
        }
    }

    fn admit(&self, state: &mut MonitorState, visitor: &Visitor) {
        state.occupy(visitor);
        tracing::info!(visitor = visitor.id(), role = %visitor.role(), name = visitor.name(), "entered the office");
        self.publish(state, EventKind::Admitted, visitor.id(), visitor.role(), visitor.name());
        Self::debug_check(state);
    }

    fn queue_request(&self, state: &mut MonitorState, visitor: &Visitor, handle: Arc<WaitHandle>) -> u64 {
        let arrival = state.enqueue(visitor, handle);
        tracing::debug!(
            visitor = visitor.id(),
            role = %visitor.role(),
            name = visitor.name(),
            arrival,
            "office busy, request queued"
        );
        self.publish(state, EventKind::Queued, visitor.id(), visitor.role(), visitor.name());
        Self::debug_check(state);
        arrival
    }

    /// Unlink a request that stopped waiting and pass on any wake it absorbed.
    fn withdraw(&self, state: &mut MonitorState, role: Role, arrival: u64) {
        let Some(waiter) = state.take_waiter(role, arrival) else {
            return;
        };
        Self::wake_next(state);
        self.publish(state, EventKind::Withdrawn, waiter.visitor, waiter.role, &waiter.name);
        Self::debug_check(state);
    }

    fn wake_next(state: &mut MonitorState) {
        if let Some(next) = state.signal_next() {
            tracing::debug!(visitor = next.visitor, role = %next.role, arrival = next.arrival, "waking next request");
            next.handle.wake();
        }
    }

    fn publish(&self, state: &mut MonitorState, kind: EventKind, visitor: VisitorId, role: Role, name: &str) {
        let event = OfficeEvent {
            seq: state.next_event_seq(),
            kind,
            visitor,
            role,
            name: name.to_owned(),
            ta_waiting: state.queue(Role::Ta).len(),
            students_waiting: state.queue(Role::Student).len(),
            occupied: state.occupant().is_some(),
            at_ms: now_ms(),
        };
        for (_, observer) in self.observers.read().iter() {
            observer.on_event(&event);
        }
    }

    fn violation(visitor: &Visitor, reason: Violation) -> MonitorError {
        tracing::error!(visitor = visitor.id(), role = %visitor.role(), %reason, "protocol violation");
        MonitorError::ProtocolViolation {
            visitor: visitor.id(),
            role: visitor.role(),
            reason,
        }
    }

    fn debug_check(state: &MonitorState) {
        if cfg!(debug_assertions) {
            if let Err(reason) = state.check_invariants() {
                panic!("office invariant broken: {reason}");
            }
        }
    }
}

#[cfg(feature = "tokio-runtime")]
impl OfficeMonitor {
    /// Enter the office from an async task, suspending until admitted.
    ///
    /// Dropping the returned future while it is queued withdraws the request.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the visitor is already inside or already waiting.
    pub async fn enter_async(&self, visitor: &Visitor) -> Result<(), MonitorError> {
        let role = visitor.role();
        let (notify, arrival) = {
            let mut state = self.state.lock();
            Self::ensure_absent(&state, visitor)?;
            if state.admits_arrival(role) {
                self.admit(&mut state, visitor);
                return Ok(());
            }
            let (handle, notify) = WaitHandle::for_task();
            let arrival = self.queue_request(&mut state, visitor, Arc::new(handle));
            (notify, arrival)
        };

        let mut pending = PendingEntry {
            monitor: self,
            role,
            arrival,
            armed: true,
        };
        loop {
            notify.notified().await;
            let mut state = self.state.lock();
            match self.recheck(&mut state, visitor, arrival) {
                Ok(false) => {}
                Ok(true) => {
                    pending.armed = false;
                    return Ok(());
                }
                Err(err) => {
                    pending.armed = false;
                    return Err(err);
                }
            }
        }
    }

    /// Async enter that gives up after `timeout`.
    ///
    /// Returns `Ok(false)` if the wait expired; the request has then been
    /// removed from its queue.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the visitor is already inside or already waiting.
    pub async fn enter_async_timeout(&self, visitor: &Visitor, timeout: Duration) -> Result<bool, MonitorError> {
        if let Ok(result) = tokio::time::timeout(timeout, self.enter_async(visitor)).await {
            result.map(|()| true)
        } else {
            tracing::warn!(visitor = visitor.id(), role = %visitor.role(), name = visitor.name(), "gave up waiting for the office");
            Ok(false)
        }
    }
}

/// Withdraws a queued async request if its future is dropped before admission.
#[cfg(feature = "tokio-runtime")]
struct PendingEntry<'a> {
    monitor: &'a OfficeMonitor,
    role: Role,
    arrival: u64,
    armed: bool,
}

#[cfg(feature = "tokio-runtime")]
impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.monitor.state.lock();
            self.monitor.withdraw(&mut state, self.role, self.arrival);
        }
    }
}

/// An admitted visit. Leaves the office when dropped.
#[must_use = "dropping a Visit immediately leaves the office"]
pub struct Visit<'a> {
    monitor: &'a OfficeMonitor,
    visitor: &'a Visitor,
    left: bool,
}

impl Visit<'_> {
    /// The visitor inside.
    #[must_use]
    pub const fn visitor(&self) -> &Visitor {
        self.visitor
    }

    /// Leave explicitly, surfacing any protocol violation.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the office was released behind this guard's back.
    pub fn leave(mut self) -> Result<(), MonitorError> {
        self.left = true;
        self.monitor.exit(self.visitor)
    }
}

impl fmt::Debug for Visit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visit").field("visitor", self.visitor).finish()
    }
}

impl Drop for Visit<'_> {
    fn drop(&mut self) {
        if !self.left {
            if let Err(err) = self.monitor.exit(self.visitor) {
                tracing::error!("visit guard failed to leave the office: {}", err);
            }
        }
    }
}
