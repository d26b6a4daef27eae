//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is the **fan-out layer** for security events after they have been
//! appended to the log. It makes these promises:
//!
//! - **Broadcast**: every subscriber gets its own copy of each published event.
//! - **Per-subscriber queues**: `publish` never waits on a consumer. A stalled
//!   subscriber only grows (or, when bounded, overflows) its own queue.
//! - **Ordered**: a single publisher's events arrive in publish order. The log
//!   serializes its publishes, which makes delivery order equal append order.
//! - **Explicit release**: `unsubscribe` stops delivery immediately and may be
//!   called any number of times, from any thread, including while a publish is
//!   in flight.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use soclab_core::SubscriptionId;

/// A subscription to an event stream.
///
/// ## Usage Pattern
///
/// ```ignore
/// let sub = log.subscribe();
///
/// loop {
///     match sub.recv_timeout(Duration::from_secs(1)) {
///         Ok(event) => render(event),
///         Err(RecvTimeoutError::Timeout) => continue,      // check for shutdown
///         Err(RecvTimeoutError::Disconnected) => break,    // unsubscribed or evicted
///     }
/// }
/// log.unsubscribe(sub.id());
/// ```
///
/// ## Thread Safety
///
/// A subscription is consumed by one thread. Dropping it releases the
/// subscriber slot on the next publish.
#[derive(Debug)]
pub struct Subscription<M> {
    id: SubscriptionId,
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(id: SubscriptionId, receiver: Receiver<M>) -> Self {
        Self { id, receiver }
    }

    /// Handle to pass to `unsubscribe`.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every message already queued, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Pub/sub bus for security events.
///
/// The trait requires `Send + Sync`: publishers and subscribers live on
/// different threads (one per simulated browser session).
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Fan a message out to every live subscriber.
    ///
    /// Returns the number of subscribers the message was queued for. A failure
    /// to reach one subscriber never prevents delivery to the others.
    fn publish(&self, message: M) -> Result<usize, Self::Error>;

    fn subscribe(&self) -> Subscription<M>;

    /// Stop delivery to a subscriber. Returns `false` if it was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Number of live subscribers.
    fn subscriber_count(&self) -> usize;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }

    fn subscriber_count(&self) -> usize {
        (**self).subscriber_count()
    }
}
