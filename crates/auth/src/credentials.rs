//! Secret verification seam for the weak-auth lab.
//!
//! The lab is about attempt limiting, not credential storage: the limiter only
//! asks "is this the right secret for this identity?". The demo account's
//! secret is kept in plain text.

use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether a supplied secret is correct for a protected identity.
///
/// Unknown identities never match.
pub trait SecretVerifier: Send + Sync {
    fn verify(&self, identity_key: &str, supplied: &str) -> bool;
}

impl<V> SecretVerifier for Arc<V>
where
    V: SecretVerifier + ?Sized,
{
    fn verify(&self, identity_key: &str, supplied: &str) -> bool {
        (**self).verify(identity_key, supplied)
    }
}

/// Fixed identity → secret table.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, identity_key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(identity_key.into(), secret.into());
        self
    }

    pub fn knows(&self, identity_key: &str) -> bool {
        self.secrets.contains_key(identity_key)
    }
}

impl SecretVerifier for StaticSecrets {
    fn verify(&self, identity_key: &str, supplied: &str) -> bool {
        self.secrets
            .get(identity_key)
            .is_some_and(|expected| expected == supplied)
    }
}
