//! Weak-authentication lab: brute-force attempt limiting.
//!
//! ## State machine (per protected identity)
//!
//! ```text
//! Open   --fail, count+1 <  max-->  Open     (count += 1)
//! Open   --fail, count+1 >= max-->  Locked   (locked_until = now + duration)
//! Locked --now >= locked_until -->  Open     (lazily, on the next attempt; count = 0)
//! Open   --success-------------->   Open     (count = 0)
//! Locked --any attempt, now < locked_until--> Locked (rejected, nothing mutated)
//! ```
//!
//! Expiry is never driven by a timer: the next evaluation compares the stored
//! instant with the injected clock. In permissive mode none of the lockout
//! transitions apply.

pub mod limiter;
pub mod policy;

pub use limiter::{AttemptLimiter, AttemptRecord, Decision, LoginOutcome};
pub use policy::{LockoutPolicy, PolicyError};
