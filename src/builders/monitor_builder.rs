//! Builds an office monitor wired with its standard observers.

use std::sync::Arc;

use anyhow::anyhow;

use crate::config::MonitorConfig;
use crate::core::{AppResult, EventLog, OfficeMonitor, OfficeObserver, TracingObserver};

/// A monitor together with the observers attached by [`build_monitor`].
#[derive(Debug, Clone)]
pub struct MonitorHandles {
    /// The shared monitor.
    pub monitor: Arc<OfficeMonitor>,
    /// Recent events, for rendering and inspection.
    pub event_log: Arc<EventLog>,
}

/// Build a monitor from configuration.
///
/// The event log is always subscribed; with a capacity of zero it keeps
/// nothing. A [`TracingObserver`] is added when `trace_events` is set.
///
/// # Errors
///
/// Fails if the configuration does not validate.
pub fn build_monitor(cfg: &MonitorConfig) -> AppResult<MonitorHandles> {
    cfg.validate().map_err(|e| anyhow!("config invalid: {e}"))?;

    let monitor = Arc::new(OfficeMonitor::new());
    let event_log = Arc::new(EventLog::new(cfg.event_log_capacity));
    let log_observer: Arc<dyn OfficeObserver> = event_log.clone();
    monitor.subscribe_shared(log_observer);
    if cfg.trace_events {
        monitor.subscribe(TracingObserver);
    }

    tracing::info!(
        event_log_capacity = cfg.event_log_capacity,
        trace_events = cfg.trace_events,
        "office monitor built"
    );
    Ok(MonitorHandles { monitor, event_log })
}
