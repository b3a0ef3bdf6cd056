//! The office monitor and its observation interface.

pub mod error;
pub mod events;
pub mod monitor;
pub mod snapshot;
pub(crate) mod state;
pub mod visitor;

pub use error::{AppResult, MonitorError, Violation};
pub use events::{EventKind, EventLog, OfficeEvent, OfficeObserver, SubscriptionId, TracingObserver};
#[cfg(not(target_arch = "wasm32"))]
pub use events::ChannelObserver;
pub use monitor::{OfficeMonitor, Visit};
pub use snapshot::{OccupantView, OfficeSnapshot, WaiterView};
pub use visitor::{Role, Visitor, VisitorId};
