//! `soclab-core`: shared building blocks for the security labs.
//!
//! This crate contains **pure** primitives (identifiers, enforcement mode,
//! time source, error model). No storage or logging concerns live here.

pub mod clock;
pub mod error;
pub mod id;
pub mod mode;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{CommentId, EventId, PrincipalId, ResourceId, SubscriptionId};
pub use mode::EnforcementMode;
