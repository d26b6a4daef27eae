//! The security event log: an ordered store plus live fan-out.

pub mod in_memory;
pub mod store;

use std::sync::Mutex;

use tracing::warn;

use soclab_core::{Clock, SubscriptionId, SystemClock};
use soclab_events::{
    EventBus, EventLog, EventLogError, InMemoryEventBus, NewSecurityEvent, SecurityEvent,
    Subscription,
};

pub use in_memory::InMemoryEventStore;
pub use store::SecurityEventStore;

/// The in-memory log used by the sandbox.
pub type InMemoryEventLog<C = SystemClock> =
    PublishingEventLog<InMemoryEventStore<C>, InMemoryEventBus<SecurityEvent>>;

/// Adapter that publishes stored events to an `EventBus` after a successful append.
///
/// Ordering invariant: **publish happens only after append succeeds**, and
/// append + publish run under one sequencing lock, so every subscriber sees
/// events in append order even with concurrent appenders.
///
/// Publishing is best-effort: a bus failure is logged, the stored event is
/// still returned.
pub struct PublishingEventLog<S, B> {
    store: S,
    bus: B,
    sequence: Mutex<()>,
}

impl<S, B> PublishingEventLog<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            sequence: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<C: Clock> InMemoryEventLog<C> {
    /// In-memory log; `subscriber_capacity` bounds each subscriber's queue.
    pub fn in_memory(clock: C, subscriber_capacity: Option<usize>) -> Self {
        let bus = match subscriber_capacity {
            Some(cap) => InMemoryEventBus::with_capacity(cap),
            None => InMemoryEventBus::new(),
        };
        Self::new(InMemoryEventStore::with_clock(clock), bus)
    }
}

impl<S, B> PublishingEventLog<S, B>
where
    S: SecurityEventStore,
{
    pub fn len(&self) -> Result<usize, EventLogError> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool, EventLogError> {
        self.store.is_empty()
    }
}

impl<S, B> EventLog for PublishingEventLog<S, B>
where
    S: SecurityEventStore,
    B: EventBus<SecurityEvent>,
{
    fn append(&self, event: NewSecurityEvent) -> Result<SecurityEvent, EventLogError> {
        // Guards no data, only the append -> publish critical section.
        let _sequence = self.sequence.lock().unwrap_or_else(|e| e.into_inner());

        let stored = self.store.append(event)?;

        if let Err(err) = self.bus.publish(stored.clone()) {
            warn!(event_id = %stored.id(), error = ?err, "failed to publish security event");
        }

        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, EventLogError> {
        self.store.recent(limit)
    }

    fn subscribe(&self) -> Subscription<SecurityEvent> {
        self.bus.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::TryRecvError;

    use soclab_events::{EventKind, EventStatus};

    fn event(reason: &str) -> NewSecurityEvent {
        NewSecurityEvent::new(EventKind::LoginAttempt, EventStatus::Fail, reason)
    }

    /// Bus whose publish always fails.
    struct BrokenBus(InMemoryEventBus<SecurityEvent>);

    impl EventBus<SecurityEvent> for BrokenBus {
        type Error = &'static str;

        fn publish(&self, _message: SecurityEvent) -> Result<usize, Self::Error> {
            Err("broken")
        }

        fn subscribe(&self) -> Subscription<SecurityEvent> {
            self.0.subscribe()
        }

        fn unsubscribe(&self, id: SubscriptionId) -> bool {
            self.0.unsubscribe(id)
        }

        fn subscriber_count(&self) -> usize {
            self.0.subscriber_count()
        }
    }

    #[test]
    fn append_stores_then_delivers() {
        let log = InMemoryEventLog::in_memory(SystemClock, None);
        let sub = log.subscribe();

        let stored = log.append(event("wrong_password")).unwrap();

        assert_eq!(sub.try_recv(), Ok(stored.clone()));
        assert_eq!(log.recent(10).unwrap(), vec![stored]);
        assert_eq!(log.len().unwrap(), 1);
    }

    #[test]
    fn subscribers_only_see_later_events() {
        let log = InMemoryEventLog::in_memory(SystemClock, None);
        log.append(event("before")).unwrap();
        let sub = log.subscribe();
        log.append(event("after")).unwrap();

        let got: Vec<String> = sub.drain().iter().map(|e| e.reason().to_string()).collect();
        assert_eq!(got, ["after"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let log = InMemoryEventLog::in_memory(SystemClock, None);
        let sub = log.subscribe();

        assert!(log.unsubscribe(sub.id()));
        assert!(!log.unsubscribe(sub.id()));
        log.append(event("x")).unwrap();

        assert_eq!(sub.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn publish_failure_does_not_fail_the_append() {
        let log = PublishingEventLog::new(InMemoryEventStore::new(), BrokenBus(InMemoryEventBus::new()));
        let stored = log.append(event("x")).unwrap();
        assert_eq!(log.recent(1).unwrap(), vec![stored]);
    }

    #[test]
    fn bounded_log_evicts_a_stalled_subscriber() {
        let log = InMemoryEventLog::in_memory(SystemClock, Some(1));
        let stalled = log.subscribe();
        log.append(event("a")).unwrap();
        log.append(event("b")).unwrap();

        assert_eq!(stalled.drain().len(), 1);
        assert_eq!(stalled.try_recv(), Err(TryRecvError::Disconnected));
        assert_eq!(log.bus().subscriber_count(), 0);
        assert_eq!(log.len().unwrap(), 2);
    }
}
