//! Drivers that run visitors on OS threads or tokio tasks.

pub mod simulator;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;

pub use simulator::{Simulator, VisitReport};
#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::{Consultation, TimedConsultation, TokioSpawner};
