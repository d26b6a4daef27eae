use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use soclab_core::{DomainError, PrincipalId};

/// Role of a signed-in principal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular lab participant.
    #[default]
    User,
    /// May open the SOC feed.
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// Maps an authenticated principal to its role.
///
/// Backed by the external user directory in a deployment; principals without
/// a profile resolve to [`Role::User`].
pub trait RoleDirectory: Send + Sync {
    fn resolve_role(&self, principal_id: &PrincipalId) -> Role;
}

impl<D> RoleDirectory for Arc<D>
where
    D: RoleDirectory + ?Sized,
{
    fn resolve_role(&self, principal_id: &PrincipalId) -> Role {
        (**self).resolve_role(principal_id)
    }
}

/// In-memory role directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRoleDirectory {
    roles: RwLock<HashMap<PrincipalId, Role>>,
}

impl InMemoryRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, principal_id: PrincipalId, role: Role) {
        self.roles
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(principal_id, role);
    }
}

impl RoleDirectory for InMemoryRoleDirectory {
    fn resolve_role(&self, principal_id: &PrincipalId) -> Role {
        self.roles
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(principal_id)
            .copied()
            .unwrap_or_default()
    }
}
