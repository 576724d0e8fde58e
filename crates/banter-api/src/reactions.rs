use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use banter_types::api::ToggleReactionRequest;
use banter_types::models::Identity;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::run_blocking;

/// Idempotent add/remove of the caller's `(emoji, handle)` pair.
/// Returns the message with its post-toggle reaction map.
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ToggleReactionRequest>,
) -> ApiResult<impl IntoResponse> {
    let message =
        run_blocking(move || state.store.toggle_reaction(id, &identity, &req.emoji, req.op))
            .await?;
    Ok(Json(message))
}
