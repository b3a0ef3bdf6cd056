//! Per-request wait handles.
//!
//! Every suspended `enter` call owns exactly one handle, so `exit` can wake
//! precisely the request it selected instead of broadcasting to all waiters.
//! A wake is only a hint: the woken request re-checks its admission
//! predicate under the monitor lock before it proceeds.

use std::time::Instant;

use parking_lot::{Condvar, MutexGuard};

#[cfg(feature = "tokio-runtime")]
use std::sync::Arc;
#[cfg(feature = "tokio-runtime")]
use tokio::sync::Notify;

/// Single-waiter notification primitive attached to one queued request.
#[derive(Debug)]
pub(crate) enum WaitHandle {
    /// An OS thread blocked on a condition variable paired with the monitor lock.
    Thread(Condvar),
    /// An async task awaiting a notification.
    #[cfg(feature = "tokio-runtime")]
    Task(Arc<Notify>),
}

impl WaitHandle {
    /// Handle for a blocking caller.
    pub(crate) const fn for_thread() -> Self {
        Self::Thread(Condvar::new())
    }

    /// Handle for an async caller, plus the notifier the caller awaits on.
    #[cfg(feature = "tokio-runtime")]
    pub(crate) fn for_task() -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        (Self::Task(Arc::clone(&notify)), notify)
    }

    /// Deliver a wake to the owning request.
    ///
    /// Must be called with the monitor lock held. A task notification is
    /// stored if the task is not currently awaiting, so it cannot be lost.
    pub(crate) fn wake(&self) {
        match self {
            Self::Thread(cvar) => {
                cvar.notify_one();
            }
            #[cfg(feature = "tokio-runtime")]
            Self::Task(notify) => notify.notify_one(),
        }
    }

    /// Block the current thread until woken, releasing `guard` meanwhile.
    ///
    /// Task handles never block here; async callers await their notifier.
    pub(crate) fn wait<T>(&self, guard: &mut MutexGuard<'_, T>) {
        if let Self::Thread(cvar) = self {
            cvar.wait(guard);
        }
    }

    /// Like [`WaitHandle::wait`] but gives up at `deadline`.
    ///
    /// Returns true if the deadline passed.
    pub(crate) fn wait_until<T>(&self, guard: &mut MutexGuard<'_, T>, deadline: Instant) -> bool {
        match self {
            Self::Thread(cvar) => cvar.wait_until(guard, deadline).timed_out(),
            #[cfg(feature = "tokio-runtime")]
            Self::Task(_) => Instant::now() >= deadline,
        }
    }
}
