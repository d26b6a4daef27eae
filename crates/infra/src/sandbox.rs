//! The security lab sandbox: one event log shared by all three labs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use soclab_auth::{InMemoryRoleDirectory, Role, StaticSecrets};
use soclab_core::{Clock, PrincipalId, ResourceId, SystemClock};
use soclab_labs::{AccessGuard, AttemptLimiter, CommentBoard, OwnerResolver};

use crate::config::SandboxConfig;
use crate::event_log::InMemoryEventLog;
use crate::soc_feed::{SocFeed, SocFeedError};

/// The identity targeted by the brute-force lab.
pub const DEMO_IDENTITY: &str = "demo-user-1";

/// Profile ownership for the IDOR lab.
#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    owners: RwLock<HashMap<ResourceId, PrincipalId>>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, profile_id: ResourceId, owner_id: PrincipalId) {
        self.owners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(profile_id, owner_id);
    }
}

impl OwnerResolver for InMemoryProfiles {
    fn resolve_owner(&self, resource_id: &ResourceId) -> Option<PrincipalId> {
        self.owners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(resource_id)
            .cloned()
    }
}

pub type SandboxLog<C> = Arc<InMemoryEventLog<Arc<C>>>;

/// Every lab component, wired to a single log and clock.
///
/// Only [`DEMO_IDENTITY`] has a secret and a lockout policy; every other
/// identity is unknown to the limiter, so its attempts always fail and never
/// lock.
pub struct Sandbox<C = SystemClock> {
    config: SandboxConfig,
    log: SandboxLog<C>,
    roles: Arc<InMemoryRoleDirectory>,
    profiles: Arc<InMemoryProfiles>,
    limiter: AttemptLimiter<StaticSecrets, SandboxLog<C>, Arc<C>>,
    access: AccessGuard<SandboxLog<C>, Arc<InMemoryProfiles>>,
    comments: CommentBoard<SandboxLog<C>, Arc<C>>,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Sandbox<C> {
    pub fn with_clock(config: SandboxConfig, clock: C) -> Self {
        let clock = Arc::new(clock);
        let log = Arc::new(InMemoryEventLog::in_memory(clock.clone(), config.subscriber_capacity));
        let roles = Arc::new(InMemoryRoleDirectory::new());
        let profiles = Arc::new(InMemoryProfiles::new());

        let secrets = StaticSecrets::new().with(DEMO_IDENTITY, config.demo_secret.clone());
        let limiter = AttemptLimiter::new(secrets, log.clone(), clock.clone())
            .with_identity_policy(DEMO_IDENTITY, config.lockout_policy);
        let access = AccessGuard::new(log.clone(), profiles.clone());
        let comments = CommentBoard::new(log.clone(), clock);

        info!(
            max_attempts = config.lockout_policy.max_attempts(),
            lockout_secs = config.lockout_policy.lockout_duration().num_seconds(),
            subscriber_capacity = ?config.subscriber_capacity,
            "sandbox ready"
        );

        Self {
            config,
            log,
            roles,
            profiles,
            limiter,
            access,
            comments,
        }
    }

    /// Register a principal with its role and its own profile (profile id =
    /// principal id).
    pub fn register_user(&self, principal_id: PrincipalId, role: Role) -> ResourceId {
        let profile_id = ResourceId::from(&principal_id);
        self.roles.assign(principal_id.clone(), role);
        self.profiles.register(profile_id.clone(), principal_id);
        profile_id
    }

    /// Open the SOC feed as `viewer` (admins only).
    pub fn soc_feed(&self, viewer: PrincipalId, backlog: usize) -> Result<SocFeed<SandboxLog<C>>, SocFeedError> {
        SocFeed::open(viewer, &self.roles, self.log.clone(), backlog)
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn log(&self) -> &SandboxLog<C> {
        &self.log
    }

    pub fn roles(&self) -> &InMemoryRoleDirectory {
        &self.roles
    }

    pub fn profiles(&self) -> &InMemoryProfiles {
        &self.profiles
    }

    pub fn limiter(&self) -> &AttemptLimiter<StaticSecrets, SandboxLog<C>, Arc<C>> {
        &self.limiter
    }

    pub fn access(&self) -> &AccessGuard<SandboxLog<C>, Arc<InMemoryProfiles>> {
        &self.access
    }

    pub fn comments(&self) -> &CommentBoard<SandboxLog<C>, Arc<C>> {
        &self.comments
    }
}
