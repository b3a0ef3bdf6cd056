//! Configuration models for the monitor and the simulation driver.

pub mod office;

pub use office::{DurationRange, MonitorConfig, SimulationConfig};
