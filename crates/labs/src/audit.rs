use core::ops::Deref;

use tracing::warn;

use soclab_core::EventId;
use soclab_events::{EventLog, EventLogError, NewSecurityEvent};

/// A lab result together with the outcome of its audit write.
///
/// Derefs to the result so callers that don't care about the audit trail can
/// use it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audited<T> {
    value: T,
    audit: Result<EventId, EventLogError>,
}

impl<T> Audited<T> {
    pub fn new(value: T, audit: Result<EventId, EventLogError>) -> Self {
        Self { value, audit }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Id of the event recorded for this result, or why recording failed.
    pub fn audit(&self) -> Result<EventId, &EventLogError> {
        self.audit.as_ref().copied()
    }

    pub fn audit_failed(&self) -> bool {
        self.audit.is_err()
    }
}

impl<T> Deref for Audited<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Append an event, reporting (not propagating) a failure.
pub(crate) fn record<L: EventLog + ?Sized>(
    log: &L,
    event: NewSecurityEvent,
) -> Result<EventId, EventLogError> {
    let kind = event.kind;
    match log.append(event) {
        Ok(stored) => Ok(stored.id()),
        Err(err) => {
            warn!(kind = %kind, error = %err, "security event append failed");
            Err(err)
        }
    }
}
