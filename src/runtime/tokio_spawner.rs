//! Tokio runtime adapter for async visitors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::simulator::VisitReport;
use crate::config::DurationRange;
use crate::core::{OfficeMonitor, Visitor};

/// What a visitor does while inside the office.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use office_monitor::core::Visitor;
/// use office_monitor::runtime::Consultation;
///
/// struct Instant;
///
/// #[async_trait]
/// impl Consultation for Instant {
///     async fn consult(&self, _visitor: &Visitor) -> std::time::Duration {
///         std::time::Duration::ZERO
///     }
/// }
/// ```
#[async_trait]
pub trait Consultation: Send + Sync + 'static {
    /// Run the consultation and return how long it took.
    async fn consult(&self, visitor: &Visitor) -> Duration;
}

/// Sleeps for a random duration drawn from a range.
#[derive(Debug)]
pub struct TimedConsultation {
    range: DurationRange,
    rng: Mutex<StdRng>,
}

impl TimedConsultation {
    /// Create a consultation drawing from `range`, seeded when `seed` is set.
    #[must_use]
    pub fn new(range: DurationRange, seed: Option<u64>) -> Self {
        Self {
            range,
            rng: Mutex::new(seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)),
        }
    }

    /// A consultation that always takes `duration`.
    #[must_use]
    pub fn fixed(duration: Duration) -> Self {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self::new(DurationRange::from_millis(ms, ms), Some(0))
    }
}

#[async_trait]
impl Consultation for TimedConsultation {
    async fn consult(&self, _visitor: &Visitor) -> Duration {
        let stay = self.range.sample(&mut *self.rng.lock());
        tokio::time::sleep(stay).await;
        stay
    }
}

/// Tokio-based spawner that runs visitors as tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Create a new `TokioSpawner` from a tokio runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Spawner bound to the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }

    /// Spawn a visitor task: enter, consult, leave.
    pub fn spawn_visitor<C>(
        &self,
        monitor: Arc<OfficeMonitor>,
        visitor: Visitor,
        consultation: Arc<C>,
    ) -> JoinHandle<VisitReport>
    where
        C: Consultation + ?Sized,
    {
        self.handle.spawn(async move {
            let started = Instant::now();
            if let Err(err) = monitor.enter_async(&visitor).await {
                error!(name = visitor.name(), error = %err, "visitor task could not enter");
                return VisitReport {
                    visitor,
                    waited: started.elapsed(),
                    consulted: Duration::ZERO,
                    error: Some(err),
                };
            }
            let waited = started.elapsed();
            debug!(name = visitor.name(), waited_ms = waited.as_millis(), "consulting");

            let consulted = consultation.consult(&visitor).await;
            let error = monitor.exit(&visitor).err();
            if let Some(err) = &error {
                error!(name = visitor.name(), error = %err, "visitor task could not leave");
            }
            VisitReport {
                visitor,
                waited,
                consulted,
                error,
            }
        })
    }
}
