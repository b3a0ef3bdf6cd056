//! Thread-based simulation driver.
//!
//! Each visitor runs on its own OS thread: it enters the office, stays for a
//! random consultation time, then leaves. An optional arrival thread keeps
//! adding visitors at random intervals until stopped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::builders::build_monitor;
use crate::config::{DurationRange, SimulationConfig};
use crate::core::{AppResult, EventLog, MonitorError, OfficeMonitor, OfficeSnapshot, Role, Visitor};

/// Outcome of one simulated visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitReport {
    /// The visitor.
    pub visitor: Visitor,
    /// Time spent waiting to enter.
    pub waited: Duration,
    /// Time spent inside.
    pub consulted: Duration,
    /// Protocol error that cut the visit short, if any.
    pub error: Option<MonitorError>,
}

impl VisitReport {
    /// The visit completed without a protocol violation.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives visitors against a shared office monitor.
///
/// Dropping the simulator stops automatic arrivals; visitors already
/// spawned finish their visit in the background.
#[derive(Debug)]
pub struct Simulator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: SimulationConfig,
    monitor: Arc<OfficeMonitor>,
    event_log: Arc<EventLog>,
    rng: Mutex<StdRng>,
    /// Names handed out so far, per role.
    issued: Mutex<[u32; 2]>,
    visitors: Mutex<Vec<JoinHandle<VisitReport>>>,
    auto: Mutex<AutoState>,
    auto_changed: Condvar,
}

#[derive(Debug, Default)]
struct AutoState {
    running: bool,
    generation: u64,
    thread: Option<JoinHandle<()>>,
}

impl Simulator {
    /// Create a simulator with its own monitor.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn new(config: SimulationConfig) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config invalid: {e}"))?;
        let handles = build_monitor(&config.monitor)?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        info!(
            ta_share = config.ta_share,
            consult_min_ms = config.consult.min_ms,
            consult_max_ms = config.consult.max_ms,
            seeded = config.seed.is_some(),
            "simulator created"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                monitor: handles.monitor,
                event_log: handles.event_log,
                rng: Mutex::new(rng),
                issued: Mutex::new([0; 2]),
                visitors: Mutex::new(Vec::new()),
                auto: Mutex::new(AutoState::default()),
                auto_changed: Condvar::new(),
            }),
        })
    }

    /// The monitor visitors contend for.
    #[must_use]
    pub fn monitor(&self) -> &Arc<OfficeMonitor> {
        &self.inner.monitor
    }

    /// Recent events.
    #[must_use]
    pub fn event_log(&self) -> &Arc<EventLog> {
        &self.inner.event_log
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.inner.config
    }

    /// Atomic view of the office.
    #[must_use]
    pub fn snapshot(&self) -> OfficeSnapshot {
        self.inner.monitor.snapshot()
    }

    /// Spawn one visitor of `role`, named `TA-01`, `S-01`... per role.
    ///
    /// # Errors
    ///
    /// Fails if the visitor thread cannot be spawned.
    pub fn add_visitor(&self, role: Role) -> AppResult<Visitor> {
        Inner::add_visitor(&self.inner, role)
    }

    /// Start automatic arrivals. Returns false if they were already running.
    ///
    /// # Errors
    ///
    /// Fails if the arrival thread cannot be spawned.
    pub fn start_auto(&self) -> AppResult<bool> {
        let mut auto = self.inner.auto.lock();
        if auto.running {
            return Ok(false);
        }
        auto.generation += 1;
        let generation = auto.generation;
        let inner = Arc::clone(&self.inner);
        let thread = thread::Builder::new()
            .name("office-arrivals".into())
            .spawn(move || Inner::arrival_loop(&inner, generation))?;
        auto.running = true;
        let previous = auto.thread.replace(thread);
        drop(auto);

        if let Some(previous) = previous {
            let _ = previous.join();
        }
        info!(generation, "automatic arrivals started");
        Ok(true)
    }

    /// Stop automatic arrivals and wait for the arrival thread to finish.
    pub fn stop_auto(&self) {
        let thread = {
            let mut auto = self.inner.auto.lock();
            if !auto.running {
                return;
            }
            auto.running = false;
            self.inner.auto_changed.notify_all();
            auto.thread.take()
        };
        if let Some(thread) = thread {
            if thread.join().is_err() {
                warn!("arrival thread panicked");
            }
        }
        info!("automatic arrivals stopped");
    }

    /// Whether automatic arrivals are running.
    #[must_use]
    pub fn is_auto_running(&self) -> bool {
        self.inner.auto.lock().running
    }

    /// Join every visitor spawned so far and collect their reports.
    ///
    /// Visitors added while this runs are joined too. Reports are in spawn
    /// order; visitors whose thread panicked are omitted.
    pub fn wait_idle(&self) -> Vec<VisitReport> {
        let mut reports = Vec::new();
        loop {
            let batch: Vec<_> = self.inner.visitors.lock().drain(..).collect();
            if batch.is_empty() {
                break;
            }
            for handle in batch {
                match handle.join() {
                    Ok(report) => reports.push(report),
                    Err(_) => error!("visitor thread panicked"),
                }
            }
        }
        debug!(visits = reports.len(), "all visitors joined");
        reports
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop_auto();
    }
}

impl Inner {
    fn add_visitor(this: &Arc<Self>, role: Role) -> AppResult<Visitor> {
        let visitor = this.next_visitor(role);
        let consult = this.sample(this.config.consult);
        let monitor = Arc::clone(&this.monitor);
        let on_thread = visitor.clone();

        let handle = thread::Builder::new()
            .name(visitor.name().to_owned())
            .spawn(move || run_visit(&monitor, on_thread, consult))?;
        this.visitors.lock().push(handle);

        info!(visitor = visitor.id(), role = %role, name = visitor.name(), "visitor arrived");
        Ok(visitor)
    }

    fn next_visitor(&self, role: Role) -> Visitor {
        let mut issued = self.issued.lock();
        let slot = match role {
            Role::Ta => 0,
            Role::Student => 1,
        };
        issued[slot] += 1;
        Visitor::new(role, format!("{}-{:02}", role.name_prefix(), issued[slot]))
    }

    fn sample(&self, range: DurationRange) -> Duration {
        range.sample(&mut *self.rng.lock())
    }

    fn arrival_loop(this: &Arc<Self>, generation: u64) {
        debug!(generation, "arrival thread started");
        loop {
            let deadline = Instant::now() + this.sample(this.config.arrival_interval);
            {
                let mut auto = this.auto.lock();
                while auto.running && auto.generation == generation {
                    if this.auto_changed.wait_until(&mut auto, deadline).timed_out() {
                        break;
                    }
                }
                if !auto.running || auto.generation != generation {
                    break;
                }
            }

            let role = if this.rng.lock().random_bool(this.config.ta_share) {
                Role::Ta
            } else {
                Role::Student
            };
            if let Err(err) = Self::add_visitor(this, role) {
                error!(error = %err, "failed to spawn visitor, stopping arrivals");
                this.auto.lock().running = false;
                break;
            }
        }
        debug!(generation, "arrival thread exiting");
    }
}

fn run_visit(monitor: &OfficeMonitor, visitor: Visitor, consult: Duration) -> VisitReport {
    let started = Instant::now();
    if let Err(err) = monitor.enter(&visitor) {
        error!(name = visitor.name(), error = %err, "visitor could not enter");
        return VisitReport {
            visitor,
            waited: started.elapsed(),
            consulted: Duration::ZERO,
            error: Some(err),
        };
    }
    let waited = started.elapsed();
    debug!(name = visitor.name(), waited_ms = waited.as_millis(), "consulting");

    thread::sleep(consult);
    let error = monitor.exit(&visitor).err();
    if let Some(err) = &error {
        error!(name = visitor.name(), error = %err, "visitor could not leave");
    }
    VisitReport {
        visitor,
        waited,
        consulted: consult,
        error,
    }
}
