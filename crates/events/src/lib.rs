//! Security events: the audit record model and its pub/sub mechanics.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod log;

pub use bus::{EventBus, Subscription};
pub use event::{EventKind, EventStatus, NewSecurityEvent, SecurityEvent};
pub use in_memory_bus::InMemoryEventBus;
pub use log::{EventLog, EventLogError};
