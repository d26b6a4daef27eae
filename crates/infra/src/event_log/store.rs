use std::sync::Arc;

use soclab_events::{EventLogError, NewSecurityEvent, SecurityEvent};

/// Storage half of the event log: ordering and persistence, no fan-out.
///
/// ## Append Semantics
///
/// `append()` assigns the next `EventId` and the insertion timestamp. Stores
/// must keep `(timestamp, id)` order identical to insertion order, so a
/// timestamp never precedes the one stored before it.
///
/// ## Error Handling
///
/// Failures are reported as [`EventLogError`]; a store never panics on a
/// poisoned lock.
pub trait SecurityEventStore: Send + Sync {
    fn append(&self, event: NewSecurityEvent) -> Result<SecurityEvent, EventLogError>;

    /// At most `limit` events, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, EventLogError>;

    fn len(&self) -> Result<usize, EventLogError>;

    fn is_empty(&self) -> Result<bool, EventLogError> {
        Ok(self.len()? == 0)
    }
}

impl<S> SecurityEventStore for Arc<S>
where
    S: SecurityEventStore + ?Sized,
{
    fn append(&self, event: NewSecurityEvent) -> Result<SecurityEvent, EventLogError> {
        (**self).append(event)
    }

    fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, EventLogError> {
        (**self).recent(limit)
    }

    fn len(&self) -> Result<usize, EventLogError> {
        (**self).len()
    }
}
