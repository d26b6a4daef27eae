use std::sync::RwLock;

use chrono::{DateTime, Utc};

use soclab_core::{Clock, EventId, SystemClock};
use soclab_events::{EventLogError, NewSecurityEvent, SecurityEvent};

use super::store::SecurityEventStore;

/// In-memory append-only security event store.
///
/// Events are kept in insertion order, which is also `(timestamp, id)` order:
/// timestamps are truncated to milliseconds and clamped so they never go
/// backwards, even if the clock does.
#[derive(Debug, Default)]
pub struct InMemoryEventStore<C = SystemClock> {
    clock: C,
    events: RwLock<Vec<SecurityEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> InMemoryEventStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            events: RwLock::new(Vec::new()),
        }
    }

    fn stamp(&self, previous: Option<&SecurityEvent>) -> DateTime<Utc> {
        let now = self.clock.now();
        let now = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        match previous {
            Some(last) if last.timestamp() > now => last.timestamp(),
            _ => now,
        }
    }
}

impl<C: Clock> SecurityEventStore for InMemoryEventStore<C> {
    fn append(&self, event: NewSecurityEvent) -> Result<SecurityEvent, EventLogError> {
        let mut events = self.events.write().map_err(|_| EventLogError::Poisoned)?;

        let last = events.last();
        let id = last.map(|e| e.id().next()).unwrap_or(EventId::new(1));
        let stored = SecurityEvent::record(id, self.stamp(last), event);

        events.push(stored.clone());
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, EventLogError> {
        let events = self.events.read().map_err(|_| EventLogError::Poisoned)?;
        Ok(events.iter().rev().take(limit).cloned().collect())
    }

    fn len(&self) -> Result<usize, EventLogError> {
        let events = self.events.read().map_err(|_| EventLogError::Poisoned)?;
        Ok(events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use soclab_core::ManualClock;
    use soclab_events::{EventKind, EventStatus};

    fn event(reason: &str) -> NewSecurityEvent {
        NewSecurityEvent::new(EventKind::LabActivity, EventStatus::Success, reason)
    }

    fn store() -> (InMemoryEventStore<std::sync::Arc<ManualClock>>, std::sync::Arc<ManualClock>) {
        let clock = std::sync::Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        (InMemoryEventStore::with_clock(clock.clone()), clock)
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let (store, _clock) = store();
        let ids: Vec<u64> = (0..3).map(|i| store.append(event(&i.to_string())).unwrap().id().get()).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let (store, clock) = store();
        for i in 0..5 {
            store.append(event(&format!("e{i}"))).unwrap();
            clock.advance(Duration::seconds(1));
        }

        let reasons: Vec<String> = store
            .recent(3)
            .unwrap()
            .iter()
            .map(|e| e.reason().to_string())
            .collect();
        assert_eq!(reasons, ["e4", "e3", "e2"]);
        assert!(store.recent(0).unwrap().is_empty());
        assert_eq!(store.recent(100).unwrap().len(), 5);
    }

    #[test]
    fn empty_store_reads_empty() {
        let store = InMemoryEventStore::new();
        assert!(store.is_empty().unwrap());
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn timestamps_are_millisecond_precision() {
        let (store, clock) = store();
        clock.advance(Duration::microseconds(1_500));
        let stored = store.append(event("x")).unwrap();
        assert_eq!(stored.timestamp().timestamp_subsec_micros(), 1_000);
    }

    #[test]
    fn clock_going_backwards_does_not_reorder() {
        let (store, clock) = store();
        let first = store.append(event("first")).unwrap();
        clock.advance(Duration::seconds(-30));
        let second = store.append(event("second")).unwrap();

        assert_eq!(second.timestamp(), first.timestamp());
        assert!(second.order_key() > first.order_key());
        assert_eq!(store.recent(1).unwrap()[0].reason(), "second");
    }
}
