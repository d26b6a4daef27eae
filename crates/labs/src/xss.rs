//! Stored-XSS lab: a comment board that either keeps raw input or escapes it.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use soclab_core::{Clock, CommentId, EnforcementMode, PrincipalId};
use soclab_events::{EventKind, EventLog, EventStatus, NewSecurityEvent};

use crate::audit::{Audited, record};

/// Escape the five HTML-significant characters so markup renders as text.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub author: Option<PrincipalId>,
    /// Stored form: what a renderer would inject into the page.
    pub text: String,
    /// The input as submitted.
    pub original: String,
    pub mode: EnforcementMode,
    pub posted_at: DateTime<Utc>,
}

/// In-memory comment board, newest first.
pub struct CommentBoard<L, C> {
    log: L,
    clock: C,
    comments: RwLock<Vec<Comment>>,
}

impl<L, C> CommentBoard<L, C>
where
    L: EventLog,
    C: Clock,
{
    pub fn new(log: L, clock: C) -> Self {
        Self {
            log,
            clock,
            comments: RwLock::new(Vec::new()),
        }
    }

    /// Post a comment.
    ///
    /// Blank input is ignored (`None`, nothing logged). Otherwise the raw
    /// payload is logged as `lab_activity` before the comment is stored.
    pub fn post(
        &self,
        author: Option<&PrincipalId>,
        text: &str,
        mode: EnforcementMode,
    ) -> Option<Audited<Comment>> {
        if text.trim().is_empty() {
            return None;
        }

        let event = NewSecurityEvent::new(EventKind::LabActivity, EventStatus::Success, "comment_posted")
            .with_principal(author.cloned())
            .with_attribute("lab", "xss")
            .with_attribute("mode", mode)
            .with_attribute("payload", text);
        let audit = record(&self.log, event);

        let stored = match mode {
            EnforcementMode::Permissive => text.to_string(),
            EnforcementMode::Enforced => escape_html(text),
        };
        let comment = Comment {
            id: CommentId::new(),
            author: author.cloned(),
            text: stored,
            original: text.to_string(),
            mode,
            posted_at: self.clock.now(),
        };
        debug!(comment = %comment.id, mode = %mode, escaped = comment.text != comment.original, "comment stored");

        self.comments
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(comment.clone());

        Some(Audited::new(comment, audit))
    }

    /// Comments, newest first.
    pub fn list(&self) -> Vec<Comment> {
        self.comments
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .cloned()
            .collect()
    }
}
