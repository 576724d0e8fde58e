use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use banter_types::models::{Identity, Message, PinOp, ReactionMap, ReactionOp};

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::guard::{self, Action};
use crate::models::{MessageRow, ReactionRow};

const MESSAGE_COLUMNS: &str = "id, author, channel, recipient, text, reply_to, pinned, created_at";

impl Database {
    // -- Mutations --

    /// Create a channel post (`channel` set) or a private message
    /// (`recipient` set). Assigns the id and creation timestamp.
    pub fn create_message(
        &self,
        author: &str,
        channel: Option<&str>,
        recipient: Option<&str>,
        text: &str,
        reply_to: Option<Uuid>,
    ) -> StoreResult<Message> {
        if text.is_empty() {
            return Err(StoreError::Validation("text must not be empty".into()));
        }
        if channel.is_some() == recipient.is_some() {
            return Err(StoreError::Validation(
                "exactly one of channel or recipient must be set".into(),
            ));
        }

        let id = Uuid::new_v4();
        let created_at = now_stamp();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(parent) = reply_to {
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1)",
                    [parent.to_string()],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(StoreError::Validation(format!(
                        "reply_to message '{}' does not exist",
                        parent
                    )));
                }
            }

            tx.execute(
                "INSERT INTO messages (id, author, channel, recipient, text, reply_to, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.to_string(),
                    author,
                    channel,
                    recipient,
                    text,
                    reply_to.map(|u| u.to_string()),
                    created_at
                ],
            )?;

            let message = message_with_reactions(&tx, &id.to_string())?;
            tx.commit()?;
            Ok(message)
        })
    }

    pub fn get_message(&self, id: Uuid) -> StoreResult<Message> {
        self.with_conn(|conn| message_with_reactions(conn, &id.to_string()))
    }

    /// Replace a message's text. Author-only.
    pub fn update_text(&self, id: Uuid, identity: &Identity, text: &str) -> StoreResult<Message> {
        if text.is_empty() {
            return Err(StoreError::Validation("text must not be empty".into()));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = message_with_reactions(&tx, &id.to_string())?;
            if !guard::permits(identity, &current, Action::EditText) {
                return Err(StoreError::Forbidden("only the author may edit a message"));
            }

            tx.execute(
                "UPDATE messages SET text = ?1 WHERE id = ?2",
                params![text, id.to_string()],
            )?;
            tx.commit()?;

            Ok(Message {
                text: text.to_string(),
                ..current
            })
        })
    }

    /// Hard delete. Author-only. The message's reaction rows go with it;
    /// replies keep their `reply_to` reference (the thread view of a
    /// deleted parent reports NotFound, the replies themselves survive).
    pub fn delete_message(&self, id: Uuid, identity: &Identity) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = message_with_reactions(&tx, &id.to_string())?;
            if !guard::permits(identity, &current, Action::Delete) {
                return Err(StoreError::Forbidden(
                    "only the author may delete a message",
                ));
            }

            tx.execute("DELETE FROM messages WHERE id = ?1", [id.to_string()])?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Idempotent reaction toggle. Add is a no-op when the caller is
    /// already present under the emoji, remove when absent. The whole
    /// read-modify-write runs on the single writer connection inside one
    /// transaction, so concurrent toggles on the same message cannot
    /// lose each other's effect.
    pub fn toggle_reaction(
        &self,
        id: Uuid,
        identity: &Identity,
        emoji: &str,
        op: ReactionOp,
    ) -> StoreResult<Message> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = message_with_reactions(&tx, &id.to_string())?;

            let action = match op {
                ReactionOp::Add => Action::AddReaction,
                ReactionOp::Remove => Action::RemoveReaction,
            };
            if !guard::permits(identity, &current, action) {
                return Err(StoreError::Forbidden("reaction not permitted"));
            }

            match op {
                ReactionOp::Add => {
                    tx.execute(
                        "INSERT OR IGNORE INTO reactions (message_id, handle, emoji, created_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![id.to_string(), identity.handle, emoji, now_stamp()],
                    )?;
                }
                ReactionOp::Remove => {
                    tx.execute(
                        "DELETE FROM reactions
                         WHERE message_id = ?1 AND handle = ?2 AND emoji = ?3",
                        params![id.to_string(), identity.handle, emoji],
                    )?;
                }
            }

            let message = message_with_reactions(&tx, &id.to_string())?;
            tx.commit()?;
            Ok(message)
        })
    }

    /// Pin or unpin a channel message. Admin-only; idempotent.
    pub fn set_pinned(&self, id: Uuid, identity: &Identity, op: PinOp) -> StoreResult<Message> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = message_with_reactions(&tx, &id.to_string())?;

            let action = match op {
                PinOp::Pin => Action::Pin,
                PinOp::Unpin => Action::Unpin,
            };
            if !guard::permits(identity, &current, action) {
                return Err(StoreError::Forbidden("pinning requires the admin role"));
            }
            if current.channel.is_none() {
                return Err(StoreError::Validation(
                    "only channel messages can be pinned".into(),
                ));
            }

            let pinned = matches!(op, PinOp::Pin);
            tx.execute(
                "UPDATE messages SET pinned = ?1 WHERE id = ?2",
                params![pinned, id.to_string()],
            )?;
            tx.commit()?;

            Ok(Message { pinned, ..current })
        })
    }

    // -- Queries --

    /// Channel feed, newest-first, pinned messages excluded (they live
    /// in the pinned feed).
    pub fn list_channel(&self, channel: &str, offset: u32, limit: u32) -> StoreResult<Vec<Message>> {
        self.with_conn(|conn| {
            let rows = select_messages(
                conn,
                "WHERE channel = ?1 AND pinned = 0
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3",
                params![channel, limit, offset],
            )?;
            assemble(conn, rows)
        })
    }

    /// A parent and its direct replies, oldest-first.
    pub fn list_thread(&self, parent_id: Uuid) -> StoreResult<(Message, Vec<Message>)> {
        self.with_conn(|conn| {
            let parent = message_with_reactions(conn, &parent_id.to_string())?;
            let rows = select_messages(
                conn,
                "WHERE reply_to = ?1 ORDER BY created_at ASC, id ASC",
                params![parent_id.to_string()],
            )?;
            let replies = assemble(conn, rows)?;
            Ok((parent, replies))
        })
    }

    pub fn list_pinned(&self, channel: &str) -> StoreResult<Vec<Message>> {
        self.with_conn(|conn| {
            let rows = select_messages(
                conn,
                "WHERE channel = ?1 AND pinned = 1
                 ORDER BY created_at DESC, id DESC",
                params![channel],
            )?;
            assemble(conn, rows)
        })
    }

    /// All messages exchanged between two handles in either direction,
    /// oldest-first. The requester must be one of the pair.
    pub fn list_private(
        &self,
        identity: &Identity,
        user_a: &str,
        user_b: &str,
    ) -> StoreResult<Vec<Message>> {
        if !guard::may_view_conversation(identity, user_a, user_b) {
            return Err(StoreError::Forbidden(
                "not a participant in this conversation",
            ));
        }

        self.with_conn(|conn| {
            let rows = select_messages(
                conn,
                "WHERE recipient IS NOT NULL
                   AND ((author = ?1 AND recipient = ?2) OR (author = ?2 AND recipient = ?1))
                 ORDER BY created_at ASC, id ASC",
                params![user_a, user_b],
            )?;
            assemble(conn, rows)
        })
    }

    /// Case-insensitive substring search over channel posts, newest-first,
    /// capped at `limit`. Private messages stay out of search; they are
    /// only reachable through the conversation endpoint.
    pub fn search(&self, query: &str, channel: Option<&str>, limit: u32) -> StoreResult<Vec<Message>> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

        self.with_conn(|conn| {
            let rows = select_messages(
                conn,
                "WHERE channel IS NOT NULL
                   AND (?2 IS NULL OR channel = ?2)
                   AND lower(text) LIKE ?1 ESCAPE '\\'
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?3",
                params![pattern, channel, limit],
            )?;
            assemble(conn, rows)
        })
    }
}

// -- Row plumbing --

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        author: row.get(1)?,
        channel: row.get(2)?,
        recipient: row.get(3)?,
        text: row.get(4)?,
        reply_to: row.get(5)?,
        pinned: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn select_messages<P: rusqlite::Params>(
    conn: &Connection,
    clause: &str,
    params: P,
) -> StoreResult<Vec<MessageRow>> {
    let sql = format!("SELECT {} FROM messages {}", MESSAGE_COLUMNS, clause);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, map_message_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_message_row(conn: &Connection, id: &str) -> StoreResult<MessageRow> {
    let sql = format!("SELECT {} FROM messages WHERE id = ?1", MESSAGE_COLUMNS);
    conn.query_row(&sql, [id], map_message_row)
        .optional()?
        .ok_or(StoreError::NotFound)
}

fn message_with_reactions(conn: &Connection, id: &str) -> StoreResult<Message> {
    let row = load_message_row(conn, id)?;
    let mut grouped = group_reactions(load_reactions(conn, std::slice::from_ref(&row.id))?);
    let reactions = grouped.remove(&row.id).unwrap_or_default();
    row.into_message(reactions)
}

/// Batch-fetch reaction rows for a page of messages in one IN query.
fn load_reactions(conn: &Connection, message_ids: &[String]) -> StoreResult<Vec<ReactionRow>> {
    if message_ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders: Vec<String> = (1..=message_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT message_id, handle, emoji FROM reactions WHERE message_id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = message_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt
        .query_map(params.as_slice(), |row| {
            Ok(ReactionRow {
                message_id: row.get(0)?,
                handle: row.get(1)?,
                emoji: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn group_reactions(rows: Vec<ReactionRow>) -> HashMap<String, ReactionMap> {
    let mut grouped: HashMap<String, ReactionMap> = HashMap::new();
    for row in rows {
        let ReactionRow {
            message_id,
            handle,
            emoji,
        } = row;
        grouped
            .entry(message_id)
            .or_default()
            .entry(emoji)
            .or_default()
            .insert(handle);
    }
    grouped
}

fn assemble(conn: &Connection, rows: Vec<MessageRow>) -> StoreResult<Vec<Message>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut grouped = group_reactions(load_reactions(conn, &ids)?);

    rows.into_iter()
        .map(|row| {
            let reactions = grouped.remove(&row.id).unwrap_or_default();
            row.into_message(reactions)
        })
        .collect()
}
