use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, PinOp, ReactionOp};

// -- JWT Claims --

/// JWT claims consumed by the claims verifier. `sub` is the user handle
/// issued by the external user service; this service only verifies, it
/// never issues tokens. Canonical definition lives here in banter-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: usize,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessageRequest {
    pub channel: Option<String>,
    pub recipient: Option<String>,
    pub text: String,
    pub reply_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub parent: Message,
    pub replies: Vec<Message>,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleReactionRequest {
    pub emoji: String,
    pub op: ReactionOp,
}

// -- Pins --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TogglePinRequest {
    pub op: PinOp,
}
