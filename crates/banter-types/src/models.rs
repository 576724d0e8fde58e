use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role that gates pinning and other moderation actions.
pub const ADMIN_ROLE: &str = "admin";

/// Per-message reactions: emoji -> set of reacting handles.
/// Assembled from the reaction rows on every read; an emoji key with an
/// empty set can never appear.
pub type ReactionMap = BTreeMap<String, BTreeSet<String>>;

/// A stored message. Either a channel post (`channel` set) or a private
/// message (`recipient` set), never both, never neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub author: String,
    pub channel: Option<String>,
    pub recipient: Option<String>,
    pub text: String,
    pub reply_to: Option<Uuid>,
    pub reactions: ReactionMap,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_private(&self) -> bool {
        self.recipient.is_some()
    }
}

/// Verified identity claims, valid for a single request. Produced by the
/// claims verifier and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub handle: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles(handle: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            handle: handle.into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }
}

/// How a reaction toggle should move the caller's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionOp {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinOp {
    Pin,
    Unpin,
}
