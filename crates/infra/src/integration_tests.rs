//! Integration tests for the full lab pipeline.
//!
//! Tests: Lab operation → EventLog → Subscription → SOC feed
//!
//! Verifies:
//! - Concurrent appends reach every subscriber exactly once, in append order
//! - `recent` is a newest-first prefix of everything appended
//! - The brute-force scenario locks, expires and unlocks with matching events
//! - Lab decisions stream live to an admin feed

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    use soclab_auth::Role;
    use soclab_core::{Clock, EnforcementMode, ManualClock, PrincipalId, SystemClock};
    use soclab_events::{EventKind, EventLog, EventStatus, NewSecurityEvent, SecurityEvent};
    use soclab_labs::LoginOutcome;

    use crate::config::SandboxConfig;
    use crate::event_log::InMemoryEventLog;
    use crate::sandbox::{DEMO_IDENTITY, Sandbox};

    fn event(reason: String) -> NewSecurityEvent {
        NewSecurityEvent::new(EventKind::LoginAttempt, EventStatus::Fail, reason)
    }

    fn pid(s: &str) -> PrincipalId {
        PrincipalId::new(s).unwrap()
    }

    fn sandbox() -> (Sandbox<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        (Sandbox::with_clock(SandboxConfig::default(), clock.clone()), clock)
    }

    #[test]
    fn concurrent_appends_reach_a_subscriber_exactly_once_in_order() {
        const WRITERS: usize = 8;
        const PER_WRITER: usize = 250;

        let log = Arc::new(InMemoryEventLog::in_memory(SystemClock, None));

        // Subscribe on the consumer thread BEFORE any events are appended.
        let (ready_tx, ready_rx) = mpsc::channel::<()>();
        let consumer = {
            let log = log.clone();
            thread::spawn(move || {
                let sub = log.subscribe();
                let _ = ready_tx.send(());
                let mut got: Vec<SecurityEvent> = Vec::new();
                while got.len() < WRITERS * PER_WRITER {
                    match sub.recv_timeout(Duration::from_secs(5)) {
                        Ok(e) => got.push(e),
                        Err(_) => break,
                    }
                }
                got
            })
        };
        ready_rx.recv_timeout(Duration::from_secs(1)).unwrap();

        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let log = log.clone();
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        log.append(event(format!("w{w}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        let got = consumer.join().unwrap();
        assert_eq!(got.len(), WRITERS * PER_WRITER);

        // Delivery order is append order: ids 1..=N with no gaps or repeats.
        let ids: Vec<u64> = got.iter().map(|e| e.id().get()).collect();
        assert!(ids.iter().copied().eq(1..=(WRITERS * PER_WRITER) as u64));

        // Each writer's own events keep their relative order.
        for w in 0..WRITERS {
            let prefix = format!("w{w}-");
            let mine: Vec<usize> = got
                .iter()
                .filter_map(|e| e.reason().strip_prefix(prefix.as_str()))
                .map(|i| i.parse().unwrap())
                .collect();
            assert!(mine.iter().copied().eq(0..PER_WRITER));
        }

        // The delivered stream and the stored log agree.
        let mut stored = log.recent(usize::MAX).unwrap();
        stored.reverse();
        assert_eq!(stored, got);
    }

    #[test]
    fn brute_force_scenario_locks_expires_and_unlocks() {
        let (sb, clock) = sandbox();
        let limiter = sb.limiter();
        let start = clock.now();

        for attempt in 1..=5u32 {
            let d = limiter.evaluate(DEMO_IDENTITY, "wrong", EnforcementMode::Enforced);
            assert_eq!(d.outcome, LoginOutcome::DeniedWrongSecret, "attempt {attempt}");
        }
        let state = limiter.state(DEMO_IDENTITY).unwrap();
        assert_eq!(state.fail_count, 5);
        assert_eq!(state.locked_until, Some(start + chrono::Duration::seconds(60)));

        let blocked = limiter.evaluate(DEMO_IDENTITY, "Secret123!", EnforcementMode::Enforced);
        assert_eq!(blocked.outcome, LoginOutcome::DeniedLocked);

        clock.advance(chrono::Duration::seconds(60));
        let ok = limiter.evaluate(DEMO_IDENTITY, "Secret123!", EnforcementMode::Enforced);
        assert_eq!(ok.outcome, LoginOutcome::Allowed);
        assert_eq!(limiter.state(DEMO_IDENTITY).unwrap().locked_until, None);

        let trail: Vec<(EventStatus, String)> = sb
            .log()
            .recent(10)
            .unwrap()
            .into_iter()
            .rev()
            .map(|e| (e.status(), e.reason().to_string()))
            .collect();
        let mut expected = vec![(EventStatus::Fail, "wrong_password".to_string()); 5];
        expected.push((EventStatus::Blocked, "account_locked".to_string()));
        expected.push((EventStatus::Success, "correct_password".to_string()));
        assert_eq!(trail, expected);
    }

    #[test]
    fn concurrent_attempts_while_locked_leave_state_unchanged() {
        let (sb, _clock) = sandbox();
        let sb = Arc::new(sb);
        for _ in 0..5 {
            sb.limiter().evaluate(DEMO_IDENTITY, "wrong", EnforcementMode::Enforced);
        }
        let locked = sb.limiter().state(DEMO_IDENTITY).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sb = sb.clone();
                thread::spawn(move || {
                    let secret = if i % 2 == 0 { "Secret123!" } else { "nope" };
                    sb.limiter()
                        .evaluate(DEMO_IDENTITY, secret, EnforcementMode::Enforced)
                        .outcome
                })
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), LoginOutcome::DeniedLocked);
        }
        assert_eq!(sb.limiter().state(DEMO_IDENTITY).unwrap(), locked);
    }

    #[test]
    fn lab_activity_streams_to_the_admin_feed_without_duplicates() {
        let (sb, _clock) = sandbox();
        let alice = pid("alice");
        let bob = pid("bob");
        sb.register_user(alice.clone(), Role::User);
        let bobs_profile = sb.register_user(bob, Role::User);
        sb.register_user(pid("root"), Role::Admin);

        sb.comments().post(Some(&alice), "<b>hello</b>", EnforcementMode::Permissive);
        let mut feed = sb.soc_feed(pid("root"), 50).unwrap();
        assert_eq!(feed.backlog().len(), 1);

        let denied = sb.access().decide_by_id(&alice, &bobs_profile, EnforcementMode::Enforced);
        assert!(!denied.is_allowed());
        sb.limiter().evaluate_as(Some(&alice), DEMO_IDENTITY, "guess", EnforcementMode::Permissive);

        let live: Vec<SecurityEvent> = (0..2)
            .map(|_| feed.next_timeout(Duration::from_secs(1)).unwrap())
            .collect();
        assert_eq!(live[0].kind(), EventKind::ProfileAccess);
        assert_eq!(live[0].reason(), "owner_mismatch");
        assert_eq!(live[1].kind(), EventKind::LoginAttempt);
        assert_eq!(live[1].principal_id(), Some(&alice));

        let mut seen = HashSet::new();
        for e in feed.backlog().iter().chain(live.iter()) {
            assert!(seen.insert(e.id()), "event {} delivered twice", e.id());
        }
        assert!(feed.drain().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        /// Property: `recent(limit)` is newest first, at most `limit` long and
        /// a prefix of the reversed append sequence.
        #[test]
        fn recent_is_a_newest_first_prefix(
            steps in prop::collection::vec(-2_000i64..5_000, 0..40),
            limit in 0usize..50,
        ) {
            let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
            let log = InMemoryEventLog::in_memory(clock.clone(), None);

            let mut appended = Vec::new();
            for (i, step) in steps.iter().enumerate() {
                // Steps may be negative: the clock is allowed to jump back.
                clock.advance(chrono::Duration::milliseconds(*step));
                appended.push(log.append(event(i.to_string())).unwrap());
            }

            let recent = log.recent(limit).unwrap();
            prop_assert!(recent.len() <= limit);
            prop_assert!(recent.windows(2).all(|w| w[0].order_key() > w[1].order_key()));

            let expected: Vec<SecurityEvent> = appended.iter().rev().take(limit).cloned().collect();
            prop_assert_eq!(recent, expected);
        }
    }
}
