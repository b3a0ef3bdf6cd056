//! # Office Monitor
//!
//! A priority monitor guarding an office that holds one visitor at a time.
//!
//! Two kinds of visitors compete for the office: teaching assistants (TAs)
//! and students. Whenever the office frees up, a waiting TA is always let in
//! before any waiting student; within each role visitors are served in
//! arrival order. Requests sleep on their own wait handle and are woken one
//! at a time, then re-check their admission condition under the lock before
//! taking the office.
//!
//! ## Key Features
//!
//! - **TA priority**: a student is never admitted while a TA is waiting
//! - **FIFO within a role**: queued visitors of the same role keep their order
//! - **Blocking and async callers**: threads park on a condition variable, tokio tasks await a notifier
//! - **Timeouts and cancellation**: abandoned requests leave their queue and pass on any wake
//! - **Observation**: atomic snapshots and an ordered event stream for presentation layers
//! - **Simulation**: a driver that spawns visitors with random consultation times
//!
//! ## Monitor
//!
//! ```rust
//! use office_monitor::core::{OfficeMonitor, Role, Visitor};
//!
//! let monitor = OfficeMonitor::new();
//! let ta = Visitor::new(Role::Ta, "TA-01");
//!
//! monitor.enter(&ta)?;
//! assert_eq!(monitor.snapshot().occupant_role(), Some(Role::Ta));
//! monitor.exit(&ta)?;
//! # Ok::<(), office_monitor::core::MonitorError>(())
//! ```
//!
//! ## Simulation
//!
//! ```rust,ignore
//! use office_monitor::config::SimulationConfig;
//! use office_monitor::runtime::Simulator;
//!
//! let simulator = Simulator::new(SimulationConfig::from_env()?)?;
//! simulator.start_auto()?;
//! // ... render simulator.monitor().snapshot() periodically ...
//! simulator.stop_auto();
//! let reports = simulator.wait_idle();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// The office monitor, its state views and its event stream.
pub mod core;
/// Configuration models for the monitor and the simulation driver.
pub mod config;
/// Builders to construct monitors from configuration.
pub mod builders;
/// Drivers that run visitors on OS threads or tokio tasks.
pub mod runtime;
/// Shared utilities.
pub mod util;

mod wait_handle;

pub use crate::core::{
    AppResult, EventKind, EventLog, MonitorError, OfficeEvent, OfficeMonitor, OfficeObserver, OfficeSnapshot,
    Role, Violation, Visit, Visitor, VisitorId,
};
