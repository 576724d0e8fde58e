//! Database row types — these map directly to SQLite rows.
//! Distinct from the banter-types domain model to keep the DB layer flat.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use banter_types::models::{Message, ReactionMap};

use crate::error::{StoreError, StoreResult};

pub struct MessageRow {
    pub id: String,
    pub author: String,
    pub channel: Option<String>,
    pub recipient: Option<String>,
    pub text: String,
    pub reply_to: Option<String>,
    pub pinned: bool,
    pub created_at: String,
}

pub struct ReactionRow {
    pub message_id: String,
    pub handle: String,
    pub emoji: String,
}

impl MessageRow {
    /// Lift a raw row into the domain model, attaching its reaction map.
    pub fn into_message(self, reactions: ReactionMap) -> StoreResult<Message> {
        let id = parse_uuid(&self.id, "message id")?;
        let reply_to = match self.reply_to.as_deref() {
            Some(raw) => Some(parse_uuid(raw, "reply_to")?),
            None => None,
        };
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| {
                StoreError::Internal(format!(
                    "corrupt created_at '{}' on message '{}': {}",
                    self.created_at, self.id, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(Message {
            id,
            author: self.author,
            channel: self.channel,
            recipient: self.recipient,
            text: self.text,
            reply_to,
            reactions,
            pinned: self.pinned,
            created_at,
        })
    }
}

fn parse_uuid(raw: &str, field: &str) -> StoreResult<Uuid> {
    raw.parse()
        .map_err(|e| StoreError::Internal(format!("corrupt {} '{}': {}", field, raw, e)))
}
