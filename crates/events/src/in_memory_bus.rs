//! In-memory event bus.

use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard, mpsc};

use tracing::warn;

use soclab_core::SubscriptionId;

use crate::bus::{EventBus, Subscription};

#[derive(Debug)]
enum Outbox<M> {
    Unbounded(mpsc::Sender<M>),
    Bounded(mpsc::SyncSender<M>),
}

#[derive(Debug)]
struct Subscriber<M> {
    id: SubscriptionId,
    outbox: Outbox<M>,
}

impl<M> Subscriber<M> {
    /// Queue a message. `false` means the subscriber must be dropped.
    fn offer(&self, message: M) -> bool {
        match &self.outbox {
            Outbox::Unbounded(tx) => tx.send(message).is_ok(),
            Outbox::Bounded(tx) => match tx.try_send(message) {
                Ok(()) => true,
                Err(mpsc::TrySendError::Full(_)) => {
                    warn!(subscription = %self.id, "subscriber queue full; evicting subscriber");
                    false
                }
                Err(mpsc::TrySendError::Disconnected(_)) => false,
            },
        }
    }
}

/// In-memory pub/sub bus.
///
/// - No IO, no async: sends never block (`publish` is safe to call while
///   holding other locks)
/// - Unbounded queues by default; with a capacity, a subscriber whose queue
///   is full is evicted instead of losing single messages, so a consumer never
///   observes a silent gap
/// - Dropped subscriptions are pruned on the next publish
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<Subscriber<M>>>,
    capacity: Option<usize>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus whose subscribers may hold at most `capacity` undelivered messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    // The registry is only ever pushed to or filtered, so a poisoned guard
    // still holds a consistent list.
    fn registry(&self) -> MutexGuard<'_, Vec<Subscriber<M>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: None,
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = Infallible;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        let mut subs = self.registry();

        // Drop dead and overflowing subscribers while publishing.
        subs.retain(|sub| sub.offer(message.clone()));

        Ok(subs.len())
    }

    fn subscribe(&self) -> Subscription<M> {
        let id = SubscriptionId::new();
        let (outbox, rx) = match self.capacity {
            Some(cap) => {
                let (tx, rx) = mpsc::sync_channel(cap);
                (Outbox::Bounded(tx), rx)
            }
            None => {
                let (tx, rx) = mpsc::channel();
                (Outbox::Unbounded(tx), rx)
            }
        };

        self.registry().push(Subscriber { id, outbox });

        Subscription::new(id, rx)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.registry();
        let before = subs.len();
        subs.retain(|sub| sub.id != id);
        subs.len() != before
    }

    fn subscriber_count(&self) -> usize {
        self.registry().len()
    }
}
