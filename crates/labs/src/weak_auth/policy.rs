use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("invalid lockout policy: {0}")]
    InvalidPolicy(String),
}

/// How many consecutive failures lock an identity, and for how long.
///
/// Immutable once built; validated at construction so a limiter can never run
/// with a policy that locks on zero attempts or for zero time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawLockoutPolicy")]
pub struct LockoutPolicy {
    max_attempts: u32,
    #[serde(with = "duration_millis")]
    lockout_duration: Duration,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Result<Self, PolicyError> {
        if max_attempts < 1 {
            return Err(PolicyError::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if lockout_duration <= Duration::zero() {
            return Err(PolicyError::InvalidPolicy(format!(
                "lockout_duration must be positive (got {lockout_duration})"
            )));
        }
        Ok(Self {
            max_attempts,
            lockout_duration,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn lockout_duration(&self) -> Duration {
        self.lockout_duration
    }
}

/// Wire shape; deserialization goes through [`LockoutPolicy::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLockoutPolicy {
    max_attempts: u32,
    #[serde(with = "duration_millis")]
    lockout_duration: Duration,
}

impl TryFrom<RawLockoutPolicy> for LockoutPolicy {
    type Error = PolicyError;

    fn try_from(raw: RawLockoutPolicy) -> Result<Self, Self::Error> {
        Self::new(raw.max_attempts, raw.lockout_duration)
    }
}

impl Default for LockoutPolicy {
    /// Five attempts, sixty seconds.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::seconds(60),
        }
    }
}

mod duration_millis {
    use chrono::Duration;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = i64::deserialize(d)?;
        Duration::try_milliseconds(ms)
            .ok_or_else(|| D::Error::custom(format!("duration of {ms}ms is out of range")))
    }
}
