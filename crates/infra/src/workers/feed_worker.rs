use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use soclab_events::{EventLog, SecurityEvent};

use crate::soc_feed::SocFeed;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<usize>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    ///
    /// Returns how many events the worker handled (0 if it panicked).
    pub fn shutdown(mut self) -> usize {
        let _ = self.shutdown.send(());
        self.join
            .take()
            .map(|j| j.join().unwrap_or(0))
            .unwrap_or(0)
    }
}

/// Live tail of a SOC feed on its own thread.
///
/// - Hands each live event to `handler`, oldest first
/// - On shutdown, handles whatever is already queued before stopping
/// - Stops by itself when the subscription is evicted
#[derive(Debug)]
pub struct FeedWorker;

impl FeedWorker {
    pub fn spawn<L, H, E>(name: &'static str, feed: SocFeed<L>, mut handler: H) -> std::io::Result<WorkerHandle>
    where
        L: EventLog + 'static,
        H: FnMut(SecurityEvent) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, feed, shutdown_rx, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<L, H, E>(
    name: &'static str,
    mut feed: SocFeed<L>,
    shutdown_rx: mpsc::Receiver<()>,
    handler: &mut H,
) -> usize
where
    L: EventLog,
    H: FnMut(SecurityEvent) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(100);
    let mut handled = 0;
    let mut handle = |event: SecurityEvent| {
        handled += 1;
        if let Err(err) = handler(event) {
            warn!(worker = name, error = ?err, "feed worker handler failed");
        }
    };

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            feed.drain().into_iter().for_each(&mut handle);
            break;
        }

        match feed.next_timeout(tick) {
            Ok(event) => handle(event),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!(worker = name, "feed subscription closed");
                break;
            }
        }
    }

    debug!(worker = name, handled, "feed worker stopped");
    handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use soclab_auth::{InMemoryRoleDirectory, Role};
    use soclab_core::{PrincipalId, SystemClock};
    use soclab_events::{EventKind, EventStatus, NewSecurityEvent};

    use crate::event_log::InMemoryEventLog;

    #[test]
    fn worker_handles_every_live_event_then_stops() {
        let log = Arc::new(InMemoryEventLog::in_memory(SystemClock, None));
        let roles = InMemoryRoleDirectory::new();
        let root = PrincipalId::new("root").unwrap();
        roles.assign(root.clone(), Role::Admin);

        let feed = SocFeed::open(root, &roles, log.clone(), 10).unwrap();
        let (seen_tx, seen_rx) = mpsc::channel();
        let worker = FeedWorker::spawn("soc-tail", feed, move |e: SecurityEvent| seen_tx.send(e.id())).unwrap();

        for i in 0..20 {
            log.append(NewSecurityEvent::new(EventKind::LabActivity, EventStatus::Success, i.to_string()))
                .unwrap();
        }

        assert_eq!(worker.shutdown(), 20);
        let ids: Vec<u64> = seen_rx.try_iter().map(|id| id.get()).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }
}
