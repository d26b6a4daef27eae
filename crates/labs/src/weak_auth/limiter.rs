use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use soclab_auth::SecretVerifier;
use soclab_core::{Clock, EnforcementMode, PrincipalId};
use soclab_events::{EventKind, EventLog, EventStatus, NewSecurityEvent};

use super::policy::LockoutPolicy;
use crate::audit::{Audited, record};

/// Result of a single login attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginOutcome {
    Allowed,
    DeniedWrongSecret,
    DeniedLocked,
}

impl LoginOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginOutcome::Allowed => "allowed",
            LoginOutcome::DeniedWrongSecret => "denied_wrong_secret",
            LoginOutcome::DeniedLocked => "denied_locked",
        }
    }
}

/// What the presentation layer shows after an attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub outcome: LoginOutcome,
    /// `None` when no attempt limit applies (permissive mode or unlimited policy).
    pub remaining_attempts: Option<u32>,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Attempt bookkeeping for one identity, in its persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub identity_key: String,
    pub fail_count: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct AttemptState {
    fail_count: u32,
    locked_until: Option<DateTime<Utc>>,
    /// `None` = unlimited: failures are counted but never lock.
    policy: Option<LockoutPolicy>,
}

impl AttemptState {
    fn new(policy: Option<LockoutPolicy>) -> Self {
        Self {
            fail_count: 0,
            locked_until: None,
            policy,
        }
    }

    fn remaining(&self) -> Option<u32> {
        self.policy
            .map(|p| p.max_attempts().saturating_sub(self.fail_count))
    }

    /// Apply one attempt to the state machine.
    fn judge(&mut self, now: DateTime<Utc>, mode: EnforcementMode, secret_ok: bool) -> Decision {
        // Lazy expiry: a lock whose window has passed is cleared before the
        // attempt is judged, so the next failure counts as #1.
        if self.locked_until.is_some_and(|until| now >= until) {
            self.fail_count = 0;
            self.locked_until = None;
        }

        if mode.is_enforced() {
            if let Some(until) = self.locked_until {
                return Decision {
                    outcome: LoginOutcome::DeniedLocked,
                    remaining_attempts: Some(0),
                    locked_until: Some(until),
                };
            }
        }

        if secret_ok {
            self.fail_count = 0;
            self.locked_until = None;
            return Decision {
                outcome: LoginOutcome::Allowed,
                remaining_attempts: if mode.is_enforced() { self.remaining() } else { None },
                locked_until: None,
            };
        }

        if !mode.is_enforced() {
            // Weak mode: unlimited guesses, nothing recorded against the account.
            return Decision {
                outcome: LoginOutcome::DeniedWrongSecret,
                remaining_attempts: None,
                locked_until: None,
            };
        }

        // Everything is computed before the first field store.
        let fail_count = self.fail_count.saturating_add(1);
        let locked_until = match self.policy {
            Some(policy) if fail_count >= policy.max_attempts() => Some(lock_deadline(now, &policy)),
            _ => self.locked_until,
        };
        self.fail_count = fail_count;
        self.locked_until = locked_until;

        Decision {
            outcome: LoginOutcome::DeniedWrongSecret,
            remaining_attempts: self.remaining(),
            locked_until: self.locked_until,
        }
    }
}

/// `now + lockout_duration`, saturating at the latest representable instant.
fn lock_deadline(now: DateTime<Utc>, policy: &LockoutPolicy) -> DateTime<Utc> {
    now.checked_add_signed(policy.lockout_duration())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

type Slot = Arc<Mutex<AttemptState>>;

/// Brute-force attempt limiter.
///
/// - One state machine per identity key, created lazily on first attempt
/// - Evaluations for the same identity are linearized by that identity's
///   mutex; evaluations for different identities only share a brief map
///   lookup
/// - Each evaluation appends exactly one `login_attempt` event, while still
///   holding the identity's lock, so the audit order matches decision order
///   for that identity
///
/// The limiter never sees credentials: secret correctness comes from the
/// injected [`SecretVerifier`].
pub struct AttemptLimiter<V, L, C> {
    verifier: V,
    log: L,
    clock: C,
    default_policy: Option<LockoutPolicy>,
    identity_policies: HashMap<String, LockoutPolicy>,
    states: RwLock<HashMap<String, Slot>>,
}

impl<V, L, C> AttemptLimiter<V, L, C>
where
    V: SecretVerifier,
    L: EventLog,
    C: Clock,
{
    /// Limiter whose identities have no attempt limit until a policy is set.
    pub fn new(verifier: V, log: L, clock: C) -> Self {
        Self {
            verifier,
            log,
            clock,
            default_policy: None,
            identity_policies: HashMap::new(),
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Policy for every identity without an explicit one.
    pub fn with_default_policy(mut self, policy: LockoutPolicy) -> Self {
        self.default_policy = Some(policy);
        self
    }

    /// Policy for one identity.
    pub fn with_identity_policy(mut self, identity_key: impl Into<String>, policy: LockoutPolicy) -> Self {
        self.identity_policies.insert(identity_key.into(), policy);
        self
    }

    pub fn policy_for(&self, identity_key: &str) -> Option<LockoutPolicy> {
        self.identity_policies
            .get(identity_key)
            .copied()
            .or(self.default_policy)
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Evaluate an anonymous login attempt.
    pub fn evaluate(
        &self,
        identity_key: &str,
        supplied_secret: &str,
        mode: EnforcementMode,
    ) -> Audited<Decision> {
        self.evaluate_as(None, identity_key, supplied_secret, mode)
    }

    /// Evaluate a login attempt made by `actor` against `identity_key`.
    pub fn evaluate_as(
        &self,
        actor: Option<&PrincipalId>,
        identity_key: &str,
        supplied_secret: &str,
        mode: EnforcementMode,
    ) -> Audited<Decision> {
        let secret_ok = self.verifier.verify(identity_key, supplied_secret);
        let slot = self.slot(identity_key);

        // `judge` stores its fields only after every fallible step, so a
        // poisoned lock still guards a consistent state.
        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());
        let decision = state.judge(self.clock.now(), mode, secret_ok);
        let fail_count = state.fail_count;

        let audit = record(
            &self.log,
            attempt_event(actor, identity_key, mode, &decision, fail_count),
        );
        drop(state);

        match decision.outcome {
            LoginOutcome::Allowed => {
                debug!(identity = identity_key, mode = %mode, "login attempt allowed");
            }
            LoginOutcome::DeniedWrongSecret if decision.locked_until.is_some() && mode.is_enforced() => {
                warn!(
                    identity = identity_key,
                    fail_count,
                    locked_until = ?decision.locked_until,
                    "identity locked after repeated failures"
                );
            }
            outcome => {
                info!(
                    identity = identity_key,
                    mode = %mode,
                    outcome = outcome.as_str(),
                    fail_count,
                    "login attempt denied"
                );
            }
        }

        Audited::new(decision, audit)
    }

    /// Current bookkeeping for an identity (`None` before its first attempt).
    ///
    /// Reports stored state as-is: an expired lock is only cleared by the next
    /// evaluation.
    pub fn state(&self, identity_key: &str) -> Option<AttemptRecord> {
        let slot = self.read_states().get(identity_key).cloned()?;
        let state = slot.lock().unwrap_or_else(|e| e.into_inner());
        Some(AttemptRecord {
            identity_key: identity_key.to_string(),
            fail_count: state.fail_count,
            locked_until: state.locked_until,
        })
    }

    /// Every identity's bookkeeping, sorted by identity key.
    pub fn snapshot(&self) -> Vec<AttemptRecord> {
        let mut keys: Vec<String> = self.read_states().keys().cloned().collect();
        keys.sort();
        keys.iter().filter_map(|k| self.state(k)).collect()
    }

    /// Load previously exported bookkeeping (e.g. after a restart).
    pub fn restore(&self, records: impl IntoIterator<Item = AttemptRecord>) {
        for rec in records {
            let slot = self.slot(&rec.identity_key);
            let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());
            state.fail_count = rec.fail_count;
            state.locked_until = rec.locked_until;
        }
    }

    fn read_states(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Slot>> {
        self.states.read().unwrap_or_else(|e| e.into_inner())
    }

    fn slot(&self, identity_key: &str) -> Slot {
        if let Some(slot) = self.read_states().get(identity_key) {
            return slot.clone();
        }

        let mut states = self.states.write().unwrap_or_else(|e| e.into_inner());
        states
            .entry(identity_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(AttemptState::new(self.policy_for(identity_key)))))
            .clone()
    }
}

fn attempt_event(
    actor: Option<&PrincipalId>,
    identity_key: &str,
    mode: EnforcementMode,
    decision: &Decision,
    fail_count: u32,
) -> NewSecurityEvent {
    let (status, reason) = match decision.outcome {
        LoginOutcome::Allowed => (EventStatus::Success, "correct_password"),
        LoginOutcome::DeniedWrongSecret => (EventStatus::Fail, "wrong_password"),
        LoginOutcome::DeniedLocked => (EventStatus::Blocked, "account_locked"),
    };

    let mut event = NewSecurityEvent::new(EventKind::LoginAttempt, status, reason)
        .with_principal(actor.cloned())
        .with_attribute("mode", mode)
        .with_attribute("identity", identity_key)
        .with_attribute("failCount", fail_count);
    if let Some(remaining) = decision.remaining_attempts {
        event = event.with_attribute("remainingAttempts", remaining);
    }
    if let Some(until) = decision.locked_until {
        // `%Y` keeps five-digit years representable.
        event = event.with_attribute("lockedUntil", until.format("%Y-%m-%dT%H:%M:%S%.3fZ"));
    }
    event
}
