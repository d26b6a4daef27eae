//! Event log doubles for unit tests.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use soclab_core::{EventId, SubscriptionId};
use soclab_events::{
    EventBus, EventLog, EventLogError, InMemoryEventBus, NewSecurityEvent, SecurityEvent,
    Subscription,
};

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Keeps every appended event in memory.
#[derive(Debug, Default)]
pub(crate) struct RecordingLog {
    events: Mutex<Vec<SecurityEvent>>,
    bus: InMemoryEventBus<SecurityEvent>,
}

impl RecordingLog {
    pub(crate) fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventLog for RecordingLog {
    fn append(&self, event: NewSecurityEvent) -> Result<SecurityEvent, EventLogError> {
        let mut events = self.events.lock().unwrap();
        let id = EventId::new(events.len() as u64 + 1);
        let stored = SecurityEvent::record(id, t0(), event);
        events.push(stored.clone());
        self.bus.publish(stored.clone()).unwrap();
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, EventLogError> {
        Ok(self.events().into_iter().rev().take(limit).collect())
    }

    fn subscribe(&self) -> Subscription<SecurityEvent> {
        self.bus.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }
}

/// Rejects every append.
#[derive(Debug, Default)]
pub(crate) struct FailingLog {
    bus: InMemoryEventBus<SecurityEvent>,
}

impl EventLog for FailingLog {
    fn append(&self, _event: NewSecurityEvent) -> Result<SecurityEvent, EventLogError> {
        Err(EventLogError::Storage("disk full".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<SecurityEvent>, EventLogError> {
        Err(EventLogError::Storage("disk full".to_string()))
    }

    fn subscribe(&self) -> Subscription<SecurityEvent> {
        self.bus.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }
}
