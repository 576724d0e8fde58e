//! Authorization policy. One pure decision function, consulted by every
//! mutating store operation inside its transaction and by the
//! private-conversation read. Route handlers never re-implement these
//! checks.

use banter_types::models::{Identity, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EditText,
    Delete,
    Pin,
    Unpin,
    AddReaction,
    RemoveReaction,
    ReadPrivate,
}

pub fn permits(identity: &Identity, message: &Message, action: Action) -> bool {
    match action {
        Action::EditText | Action::Delete => identity.handle == message.author,
        Action::Pin | Action::Unpin => identity.is_admin(),
        // Anyone may react; removal only ever touches the caller's own
        // membership, which the toggle engine guarantees by construction.
        Action::AddReaction | Action::RemoveReaction => true,
        Action::ReadPrivate => {
            identity.handle == message.author
                || message.recipient.as_deref() == Some(identity.handle.as_str())
        }
    }
}

/// Pair-level check for listing a private conversation.
pub fn may_view_conversation(identity: &Identity, user_a: &str, user_b: &str) -> bool {
    identity.handle == user_a || identity.handle == user_b
}
