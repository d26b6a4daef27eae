//! The security event log contract.

use std::sync::Arc;

use thiserror::Error;

use soclab_core::SubscriptionId;

use crate::bus::Subscription;
use crate::event::{NewSecurityEvent, SecurityEvent};

/// Event log operation error.
///
/// Appends are best-effort audit writes: callers report these errors, they
/// never let them change a security decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventLogError {
    #[error("event log lock poisoned")]
    Poisoned,

    #[error("event log storage failure: {0}")]
    Storage(String),
}

/// Append-only, ordered record of security events with live fan-out.
///
/// ## Append Semantics
///
/// `append()`:
/// - assigns a strictly increasing `EventId` and the insertion timestamp
/// - stores the event (never mutated or deleted afterwards)
/// - queues it for every active subscriber without waiting on any of them
///
/// ## Read Semantics
///
/// `recent(limit)` returns at most `limit` events, newest first by
/// `(timestamp, id)`. The returned vector is a snapshot: later appends do not
/// change it.
///
/// ## Subscription Semantics
///
/// A subscription receives every event appended after `subscribe()` returns,
/// in append order, exactly once, until `unsubscribe()` (or drop).
pub trait EventLog: Send + Sync {
    fn append(&self, event: NewSecurityEvent) -> Result<SecurityEvent, EventLogError>;

    fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, EventLogError>;

    fn subscribe(&self) -> Subscription<SecurityEvent>;

    /// Idempotent; `false` if the subscription was already released.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

impl<L> EventLog for Arc<L>
where
    L: EventLog + ?Sized,
{
    fn append(&self, event: NewSecurityEvent) -> Result<SecurityEvent, EventLogError> {
        (**self).append(event)
    }

    fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, EventLogError> {
        (**self).recent(limit)
    }

    fn subscribe(&self) -> Subscription<SecurityEvent> {
        (**self).subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}
