use serde::{Deserialize, Serialize};

use soclab_core::PrincipalId;

use crate::{Permission, Role, RoleDirectory};

/// A resolved principal: the `(principal_id, role)` pair the labs consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub role: Role,
}

impl Principal {
    pub fn new(principal_id: PrincipalId, role: Role) -> Self {
        Self { principal_id, role }
    }

    /// Resolve the role through a directory.
    pub fn resolve(principal_id: PrincipalId, directory: &impl RoleDirectory) -> Self {
        let role = directory.resolve_role(&principal_id);
        Self { principal_id, role }
    }

    /// Permissions granted by the principal's role.
    pub fn permissions(&self) -> Vec<Permission> {
        crate::permissions::granted_by(self.role)
    }
}
