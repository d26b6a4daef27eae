//! Infrastructure: the in-memory security event log, configuration, the
//! admin SOC feed (with its live-tail worker) and the sandbox that wires
//! everything together.

pub mod config;
pub mod event_log;
pub mod sandbox;
pub mod soc_feed;
pub mod workers;

mod integration_tests;

pub use config::{ConfigError, SandboxConfig};
pub use event_log::{InMemoryEventLog, InMemoryEventStore, PublishingEventLog, SecurityEventStore};
pub use sandbox::{DEMO_IDENTITY, InMemoryProfiles, Sandbox, SandboxLog};
pub use soc_feed::{SocFeed, SocFeedError};
pub use workers::{FeedWorker, WorkerHandle};
