pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod pins;
pub mod query;
pub mod reactions;

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;

use crate::auth::AppState;
use crate::error::ApiError;

/// The full route surface. Everything except the health check sits
/// behind the claims-verifier middleware.
pub fn router(state: AppState) -> Router {
    let public = Router::new().route("/", get(health));

    let protected = Router::new()
        .route("/messages", post(messages::post_message))
        .route(
            "/messages/{id}",
            axum::routing::patch(messages::edit_message).delete(messages::delete_message),
        )
        .route("/messages/{id}/thread", get(messages::get_thread))
        .route("/messages/{id}/reactions", post(reactions::toggle_reaction))
        .route("/messages/{id}/pin", put(pins::toggle_pin))
        .route("/channels/{channel}/messages", get(messages::get_channel_feed))
        .route("/channels/{channel}/pins", get(messages::get_pinned))
        .route(
            "/conversations/{user_a}/{user_b}",
            get(messages::get_private_conversation),
        )
        .route("/search", get(messages::search))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "banter" }))
}

/// Run a store call off the async runtime and fold both failure layers
/// into `ApiError`.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, banter_db::StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("spawn_blocking join error: {}", e)))?
        .map_err(ApiError::from)
}
