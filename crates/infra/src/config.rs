//! Sandbox configuration from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `SOCLAB_MAX_ATTEMPTS` | `5` |
//! | `SOCLAB_LOCKOUT_SECS` | `60` |
//! | `SOCLAB_SUBSCRIBER_CAPACITY` | `1024` |
//! | `SOCLAB_DEMO_SECRET` | `Secret123!` |

use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

use soclab_labs::{LockoutPolicy, PolicyError};

pub const MAX_ATTEMPTS_VAR: &str = "SOCLAB_MAX_ATTEMPTS";
pub const LOCKOUT_SECS_VAR: &str = "SOCLAB_LOCKOUT_SECS";
pub const SUBSCRIBER_CAPACITY_VAR: &str = "SOCLAB_SUBSCRIBER_CAPACITY";
pub const DEMO_SECRET_VAR: &str = "SOCLAB_DEMO_SECRET";

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_LOCKOUT_SECS: i64 = 60;
const DEFAULT_DEMO_SECRET: &str = "Secret123!";
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    Parse { var: &'static str, value: String },

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Lockout applied to the demo identity in enforced mode.
    pub lockout_policy: LockoutPolicy,
    /// Per-subscriber queue bound; `None` means unbounded (never produced
    /// from the environment).
    pub subscriber_capacity: Option<usize>,
    pub demo_secret: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            lockout_policy: LockoutPolicy::default(),
            subscriber_capacity: Some(DEFAULT_SUBSCRIBER_CAPACITY),
            demo_secret: DEFAULT_DEMO_SECRET.to_string(),
        }
    }
}

impl SandboxConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup` (variable name -> value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_attempts = parse_or(&lookup, MAX_ATTEMPTS_VAR, DEFAULT_MAX_ATTEMPTS)?;
        let lockout_secs = parse_or(&lookup, LOCKOUT_SECS_VAR, DEFAULT_LOCKOUT_SECS)?;
        let lockout_duration = Duration::try_seconds(lockout_secs).ok_or_else(|| ConfigError::Invalid {
            var: LOCKOUT_SECS_VAR,
            reason: format!("{lockout_secs} seconds is out of range"),
        })?;
        let lockout_policy = LockoutPolicy::new(max_attempts, lockout_duration)?;

        let subscriber_capacity =
            match parse_or(&lookup, SUBSCRIBER_CAPACITY_VAR, DEFAULT_SUBSCRIBER_CAPACITY)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        var: SUBSCRIBER_CAPACITY_VAR,
                        reason: "must be at least 1".to_string(),
                    });
                }
                cap => Some(cap),
            };

        let demo_secret = match lookup(DEMO_SECRET_VAR) {
            Some(secret) if secret.is_empty() => {
                return Err(ConfigError::Invalid {
                    var: DEMO_SECRET_VAR,
                    reason: "must not be empty".to_string(),
                });
            }
            Some(secret) => secret,
            None => {
                warn!("{DEMO_SECRET_VAR} not set; using the well-known lab secret");
                DEFAULT_DEMO_SECRET.to_string()
            }
        };

        Ok(Self {
            lockout_policy,
            subscriber_capacity,
            demo_secret,
        })
    }
}

fn parse<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Parse {
        var,
        value: raw.to_string(),
    })
}

fn parse_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => parse(var, &raw),
        None => {
            warn!("{var} not set; using default {default}");
            Ok(default)
        }
    }
}
