//! IDOR lab: ownership check on directly referenced resources.
//!
//! In permissive mode any resolvable resource id is viewable, which is the
//! Insecure Direct Object Reference. In enforced mode only the owner may view
//! it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use soclab_core::{EnforcementMode, PrincipalId, ResourceId};
use soclab_events::{EventKind, EventLog, EventStatus, NewSecurityEvent};

use crate::audit::{Audited, record};

/// A resource subject to the ownership check (e.g. a user profile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub owner_id: PrincipalId,
}

impl Resource {
    pub fn new(id: ResourceId, owner_id: PrincipalId) -> Self {
        Self { id, owner_id }
    }
}

/// Looks up who owns a resource. `None` means the resource does not exist.
pub trait OwnerResolver: Send + Sync {
    fn resolve_owner(&self, resource_id: &ResourceId) -> Option<PrincipalId>;
}

impl<R> OwnerResolver for Arc<R>
where
    R: OwnerResolver + ?Sized,
{
    fn resolve_owner(&self, resource_id: &ResourceId) -> Option<PrincipalId> {
        (**self).resolve_owner(resource_id)
    }
}

impl OwnerResolver for HashMap<ResourceId, PrincipalId> {
    fn resolve_owner(&self, resource_id: &ResourceId) -> Option<PrincipalId> {
        self.get(resource_id).cloned()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    OwnerMismatch,
    NotFound,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// The ownership predicate itself.
pub fn is_access_allowed(requester: &PrincipalId, owner: &PrincipalId, mode: EnforcementMode) -> bool {
    match mode {
        EnforcementMode::Permissive => true,
        EnforcementMode::Enforced => requester == owner,
    }
}

/// Access decision check.
///
/// Holds no state between calls; the only side effect is one
/// `profile_access` event per decision.
pub struct AccessGuard<L, R> {
    log: L,
    owners: R,
}

impl<L, R> AccessGuard<L, R>
where
    L: EventLog,
    R: OwnerResolver,
{
    pub fn new(log: L, owners: R) -> Self {
        Self { log, owners }
    }

    /// Decide whether `requester` may view `resource`.
    pub fn decide(
        &self,
        requester: &PrincipalId,
        resource: &Resource,
        mode: EnforcementMode,
    ) -> Audited<AccessDecision> {
        let decision = if is_access_allowed(requester, &resource.owner_id, mode) {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny(DenyReason::OwnerMismatch)
        };
        self.finish(requester, &resource.id, mode, decision)
    }

    /// Resolve the owner of `resource_id`, then decide.
    ///
    /// An unknown id is denied in both modes.
    pub fn decide_by_id(
        &self,
        requester: &PrincipalId,
        resource_id: &ResourceId,
        mode: EnforcementMode,
    ) -> Audited<AccessDecision> {
        match self.owners.resolve_owner(resource_id) {
            Some(owner_id) => self.decide(requester, &Resource::new(resource_id.clone(), owner_id), mode),
            None => self.finish(requester, resource_id, mode, AccessDecision::Deny(DenyReason::NotFound)),
        }
    }

    fn finish(
        &self,
        requester: &PrincipalId,
        resource_id: &ResourceId,
        mode: EnforcementMode,
        decision: AccessDecision,
    ) -> Audited<AccessDecision> {
        let (status, reason) = match decision {
            AccessDecision::Allow => (EventStatus::Success, "profile_loaded"),
            AccessDecision::Deny(DenyReason::OwnerMismatch) => (EventStatus::Blocked, "owner_mismatch"),
            AccessDecision::Deny(DenyReason::NotFound) => (EventStatus::Fail, "profile_not_found"),
        };

        if decision.is_allowed() {
            debug!(requester = %requester, target = %resource_id, mode = %mode, "profile access allowed");
        } else {
            info!(requester = %requester, target = %resource_id, mode = %mode, reason, "profile access denied");
        }

        let event = NewSecurityEvent::new(EventKind::ProfileAccess, status, reason)
            .with_principal(Some(requester.clone()))
            .with_attribute("mode", mode)
            .with_attribute("targetId", resource_id);
        Audited::new(decision, record(&self.log, event))
    }
}
