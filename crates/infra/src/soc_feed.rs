//! Admin-only SOC view over the security event log.
//!
//! Opening a feed subscribes first and reads the backlog second, so an event
//! appended in between is never lost; it may show up in both, and the feed
//! filters it out of the live stream by id.

use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use soclab_auth::{AuthzError, Permission, Principal, RoleDirectory, authorize};
use soclab_core::{EventId, PrincipalId};
use soclab_events::{EventLog, EventLogError, SecurityEvent, Subscription};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SocFeedError {
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Log(#[from] EventLogError),
}

/// A backlog snapshot plus the live stream after it.
///
/// Live events are always newer than the newest backlog event. The
/// subscription is released when the feed is dropped.
pub struct SocFeed<L: EventLog> {
    log: L,
    viewer: Principal,
    backlog: Vec<SecurityEvent>,
    newest_seen: Option<EventId>,
    subscription: Subscription<SecurityEvent>,
}

impl<L: EventLog> SocFeed<L> {
    /// Open a feed for `viewer` showing up to `backlog` recent events.
    ///
    /// Only principals holding `soc.read` (admins) are admitted.
    pub fn open(
        viewer: PrincipalId,
        directory: &impl RoleDirectory,
        log: L,
        backlog: usize,
    ) -> Result<Self, SocFeedError> {
        let viewer = Principal::resolve(viewer, directory);
        authorize(&viewer, &Permission::SOC_READ)?;

        let subscription = log.subscribe();
        let backlog = match log.recent(backlog) {
            Ok(events) => events,
            Err(err) => {
                log.unsubscribe(subscription.id());
                return Err(err.into());
            }
        };
        let newest_seen = backlog.first().map(|e| e.id());

        info!(
            viewer = %viewer.principal_id,
            backlog = backlog.len(),
            subscription = %subscription.id(),
            "SOC feed opened"
        );

        Ok(Self {
            log,
            viewer,
            backlog,
            newest_seen,
            subscription,
        })
    }

    pub fn viewer(&self) -> &Principal {
        &self.viewer
    }

    /// Events that existed when the feed opened, newest first.
    pub fn backlog(&self) -> &[SecurityEvent] {
        &self.backlog
    }

    /// Wait up to `timeout` for the next live event.
    ///
    /// `Disconnected` means the subscription was evicted or released.
    pub fn next_timeout(&mut self, timeout: Duration) -> Result<SecurityEvent, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = self.subscription.recv_timeout(remaining)?;
            if self.accept(&event) {
                return Ok(event);
            }
        }
    }

    /// Next live event if one is already queued.
    pub fn try_next(&mut self) -> Result<SecurityEvent, TryRecvError> {
        loop {
            let event = self.subscription.try_recv()?;
            if self.accept(&event) {
                return Ok(event);
            }
        }
    }

    /// Every live event queued right now, oldest first.
    pub fn drain(&mut self) -> Vec<SecurityEvent> {
        std::iter::from_fn(|| self.try_next().ok()).collect()
    }

    /// Release the subscription.
    pub fn close(self) {}

    fn accept(&mut self, event: &SecurityEvent) -> bool {
        if self.newest_seen.is_some_and(|seen| event.id() <= seen) {
            debug!(event_id = %event.id(), "skipping event already in the backlog");
            return false;
        }
        self.newest_seen = Some(event.id());
        true
    }
}

impl<L: EventLog> Drop for SocFeed<L> {
    fn drop(&mut self) {
        self.log.unsubscribe(self.subscription.id());
        debug!(subscription = %self.subscription.id(), "SOC feed closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use soclab_auth::{InMemoryRoleDirectory, Role};
    use soclab_core::SystemClock;
    use soclab_events::{EventBus, EventKind, EventStatus, NewSecurityEvent};

    use crate::event_log::InMemoryEventLog;

    fn pid(s: &str) -> PrincipalId {
        PrincipalId::new(s).unwrap()
    }

    fn setup() -> (Arc<InMemoryEventLog>, InMemoryRoleDirectory) {
        let roles = InMemoryRoleDirectory::new();
        roles.assign(pid("root"), Role::Admin);
        (Arc::new(InMemoryEventLog::in_memory(SystemClock, None)), roles)
    }

    fn append(log: &InMemoryEventLog, reason: &str) -> SecurityEvent {
        log.append(NewSecurityEvent::new(EventKind::LabActivity, EventStatus::Success, reason))
            .unwrap()
    }

    #[test]
    fn regular_users_are_forbidden() {
        let (log, roles) = setup();
        let err = SocFeed::open(pid("alice"), &roles, log.clone(), 10).err().unwrap();
        assert_eq!(err, SocFeedError::Forbidden(AuthzError::Forbidden("soc.read".to_string())));
        assert_eq!(log.bus().subscriber_count(), 0);
    }

    #[test]
    fn admin_gets_backlog_then_live_events() {
        let (log, roles) = setup();
        append(&log, "old-1");
        append(&log, "old-2");

        let mut feed = SocFeed::open(pid("root"), &roles, log.clone(), 10).unwrap();
        let backlog: Vec<&str> = feed.backlog().iter().map(|e| e.reason()).collect();
        assert_eq!(backlog, ["old-2", "old-1"]);

        let live = append(&log, "new");
        assert_eq!(feed.next_timeout(Duration::from_secs(1)), Ok(live));
        assert_eq!(feed.try_next(), Err(TryRecvError::Empty));
    }

    #[test]
    fn events_in_the_backlog_are_not_repeated_live() {
        let (log, roles) = setup();
        let mut feed = SocFeed::open(pid("root"), &roles, log.clone(), 10).unwrap();
        append(&log, "a");
        append(&log, "b");

        // Simulate the open race: the backlog already holds "a".
        feed.newest_seen = Some(EventId::new(1));

        let live: Vec<String> = feed.drain().iter().map(|e| e.reason().to_string()).collect();
        assert_eq!(live, ["b"]);
    }

    #[test]
    fn dropping_the_feed_unsubscribes() {
        let (log, roles) = setup();
        let feed = SocFeed::open(pid("root"), &roles, log.clone(), 0).unwrap();
        assert!(feed.backlog().is_empty());
        assert_eq!(log.bus().subscriber_count(), 1);

        feed.close();
        assert_eq!(log.bus().subscriber_count(), 0);
    }
}
