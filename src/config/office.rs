//! Monitor and simulation configuration structures.

use std::time::Duration;

use anyhow::{anyhow, Context};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Inclusive range of milliseconds a random duration is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    /// Lower bound in milliseconds.
    pub min_ms: u64,
    /// Upper bound in milliseconds.
    pub max_ms: u64,
}

impl DurationRange {
    /// Create a range from bounds in milliseconds.
    #[must_use]
    pub const fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Validate the bounds.
    ///
    /// # Errors
    ///
    /// Returns a message if `min_ms` exceeds `max_ms`.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_ms > self.max_ms {
            return Err(format!("min_ms ({}) must not exceed max_ms ({})", self.min_ms, self.max_ms));
        }
        Ok(())
    }

    /// Draw a duration uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }
}

/// Monitor wiring options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Events kept by the in-memory event log. Zero disables the log.
    pub event_log_capacity: usize,
    /// Emit every event as a `tracing` record.
    pub trace_events: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            event_log_capacity: 256,
            trace_events: false,
        }
    }
}

impl MonitorConfig {
    /// Validate monitor configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message if the event log capacity is out of range.
    pub fn validate(&self) -> Result<(), String> {
        if self.event_log_capacity > 1_000_000 {
            return Err("event_log_capacity must not exceed 1000000".into());
        }
        Ok(())
    }
}

/// Settings for the simulation driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Monitor wiring.
    pub monitor: MonitorConfig,
    /// How long a visitor stays inside.
    pub consult: DurationRange,
    /// Gap between automatic arrivals.
    pub arrival_interval: DurationRange,
    /// Probability that an automatic arrival is a TA.
    pub ta_share: f64,
    /// Seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            consult: DurationRange::from_millis(1500, 3000),
            arrival_interval: DurationRange::from_millis(800, 1800),
            ta_share: 0.35,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Validate all values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.monitor.validate().map_err(|e| format!("monitor invalid: {e}"))?;
        self.consult.validate().map_err(|e| format!("consult invalid: {e}"))?;
        self.arrival_interval
            .validate()
            .map_err(|e| format!("arrival_interval invalid: {e}"))?;
        if self.arrival_interval.max_ms == 0 {
            return Err("arrival_interval must allow a non-zero gap".into());
        }
        if !(0.0..=1.0).contains(&self.ta_share) {
            return Err(format!("ta_share must be within [0, 1], got {}", self.ta_share));
        }
        Ok(())
    }

    /// Parse simulation configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a `parse error:` message for malformed JSON, or the
    /// validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load defaults overridden by `OFFICE_*` environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Fails if a variable does not parse or the result does not validate.
    pub fn from_env() -> AppResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`SimulationConfig::from_env`] but reads variables through `lookup`.
    ///
    /// Recognized keys: `OFFICE_CONSULT_MIN_MS`, `OFFICE_CONSULT_MAX_MS`,
    /// `OFFICE_ARRIVAL_MIN_MS`, `OFFICE_ARRIVAL_MAX_MS`, `OFFICE_TA_SHARE`,
    /// `OFFICE_SEED`, `OFFICE_EVENT_LOG_CAPACITY`, `OFFICE_TRACE_EVENTS`.
    ///
    /// # Errors
    ///
    /// Fails if a variable does not parse or the result does not validate.
    pub fn from_vars<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var(&lookup, "OFFICE_CONSULT_MIN_MS")? {
            cfg.consult.min_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "OFFICE_CONSULT_MAX_MS")? {
            cfg.consult.max_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "OFFICE_ARRIVAL_MIN_MS")? {
            cfg.arrival_interval.min_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "OFFICE_ARRIVAL_MAX_MS")? {
            cfg.arrival_interval.max_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "OFFICE_TA_SHARE")? {
            cfg.ta_share = v;
        }
        if let Some(v) = parse_var(&lookup, "OFFICE_SEED")? {
            cfg.seed = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "OFFICE_EVENT_LOG_CAPACITY")? {
            cfg.monitor.event_log_capacity = v;
        }
        if let Some(v) = parse_var(&lookup, "OFFICE_TRACE_EVENTS")? {
            cfg.monitor.trace_events = v;
        }
        cfg.validate().map_err(|e| anyhow!("config invalid: {e}"))?;
        Ok(cfg)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> AppResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("{key}={raw:?} is not valid")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_stays_in_range() {
        let range = DurationRange::from_millis(10, 20);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let d = range.sample(&mut rng);
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_degenerate_range_is_fixed() {
        let range = DurationRange::from_millis(5, 5);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(range.sample(&mut rng), Duration::from_millis(5));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(SimulationConfig::default().validate().is_ok());
    }
}
