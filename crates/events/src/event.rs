use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use soclab_core::{EventId, PrincipalId};

/// What kind of occurrence an event records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A login attempt against a protected identity (weak-auth lab).
    LoginAttempt,
    /// A profile/resource load subject to an ownership check (IDOR lab).
    ProfileAccess,
    /// Any other lab interaction (e.g. a comment posted to the XSS board).
    LabActivity,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::LoginAttempt => "login_attempt",
            EventKind::ProfileAccess => "profile_access",
            EventKind::LabActivity => "lab_activity",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome recorded on an event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Success,
    Fail,
    Blocked,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Success => "success",
            EventStatus::Fail => "fail",
            EventStatus::Blocked => "blocked",
        }
    }
}

impl core::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event as submitted by a lab component.
///
/// The log assigns `id` and `timestamp` on append; callers never choose them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSecurityEvent {
    pub kind: EventKind,
    pub principal_id: Option<PrincipalId>,
    pub status: EventStatus,
    pub reason: String,
    pub attributes: BTreeMap<String, String>,
}

impl NewSecurityEvent {
    pub fn new(kind: EventKind, status: EventStatus, reason: impl Into<String>) -> Self {
        Self {
            kind,
            principal_id: None,
            status,
            reason: reason.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_principal(mut self, principal_id: Option<PrincipalId>) -> Self {
        self.principal_id = principal_id;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.insert(key.into(), value.to_string());
        self
    }
}

/// A security event stored in the log.
///
/// Events are facts: immutable once created, never deleted. Ordering is total
/// by `(timestamp, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    id: EventId,
    timestamp: DateTime<Utc>,
    kind: EventKind,
    principal_id: Option<PrincipalId>,
    status: EventStatus,
    reason: String,
    attributes: BTreeMap<String, String>,
}

impl SecurityEvent {
    /// Seal a submitted event with its log position and insertion time.
    pub fn record(id: EventId, timestamp: DateTime<Utc>, event: NewSecurityEvent) -> Self {
        Self {
            id,
            timestamp,
            kind: event.kind,
            principal_id: event.principal_id,
            status: event.status,
            reason: event.reason,
            attributes: event.attributes,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn principal_id(&self) -> Option<&PrincipalId> {
        self.principal_id.as_ref()
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Sort key of the log's total order.
    pub fn order_key(&self) -> (DateTime<Utc>, EventId) {
        (self.timestamp, self.id)
    }
}
