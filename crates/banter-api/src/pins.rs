use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use banter_types::api::TogglePinRequest;
use banter_types::models::Identity;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::run_blocking;

/// Admin-only pin/unpin of a channel message.
pub async fn toggle_pin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<TogglePinRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = run_blocking(move || state.store.set_pinned(id, &identity, req.op)).await?;
    Ok(Json(message))
}
