//! The three security labs, each with a vulnerable and a hardened path.
//!
//! - [`weak_auth`]: brute-force attempt limiter with lazy lockout expiry
//! - [`idor`]: ownership check on direct object references
//! - [`xss`]: stored comment board with optional HTML escaping
//!
//! Every lab operation appends exactly one event to the security event log.
//! Logging is best-effort: a failed append is reported next to the result
//! (see [`Audited`]) but never changes the security decision. The control
//! stays available even when the audit trail does not.

pub mod audit;
pub mod idor;
pub mod weak_auth;
pub mod xss;

#[cfg(test)]
pub(crate) mod test_support;

pub use audit::Audited;
pub use idor::{AccessDecision, AccessGuard, DenyReason, OwnerResolver, Resource};
pub use weak_auth::{
    AttemptLimiter, AttemptRecord, Decision, LockoutPolicy, LoginOutcome, PolicyError,
};
pub use xss::{Comment, CommentBoard, escape_html};
