//! `soclab-auth`: identity/role boundary consumed by the labs.
//!
//! Authentication itself belongs to the external identity provider. This crate
//! only models what the labs consume: a `(principal_id, role)` pair, the
//! permission check that gates the SOC feed, and the seam through which the
//! weak-auth lab asks whether a supplied secret is correct.

pub mod authorize;
pub mod credentials;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use credentials::{SecretVerifier, StaticSecrets};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::{InMemoryRoleDirectory, Role, RoleDirectory};
