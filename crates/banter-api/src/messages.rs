use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use banter_types::api::{EditMessageRequest, PostMessageRequest, ThreadResponse};
use banter_types::models::Identity;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::query::{self, FeedQuery, SearchParams};
use crate::run_blocking;

pub async fn post_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PostMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = run_blocking(move || {
        state.store.create_message(
            &identity.handle,
            req.channel.as_deref(),
            req.recipient.as_deref(),
            &req.text,
            req.reply_to,
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_channel_feed(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Query(page): Query<FeedQuery>,
    Extension(_identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let (offset, limit) = page.clamped();
    let messages = run_blocking(move || state.store.list_channel(&channel, offset, limit)).await?;
    Ok(Json(messages))
}

pub async fn get_pinned(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Extension(_identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let messages = run_blocking(move || state.store.list_pinned(&channel)).await?;
    Ok(Json(messages))
}

pub async fn edit_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<EditMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message =
        run_blocking(move || state.store.update_text(id, &identity, &req.text)).await?;
    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    run_blocking(move || state.store.delete_message(id, &identity)).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn get_thread(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let (parent, replies) = run_blocking(move || state.store.list_thread(id)).await?;
    Ok(Json(ThreadResponse { parent, replies }))
}

pub async fn get_private_conversation(
    State(state): State<AppState>,
    Path((user_a, user_b)): Path<(String, String)>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let messages =
        run_blocking(move || state.store.list_private(&identity, &user_a, &user_b)).await?;
    Ok(Json(messages))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Extension(_identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    query::validate_search_query(&params.q)?;

    let messages = run_blocking(move || {
        state
            .store
            .search(&params.q, params.channel.as_deref(), query::MAX_SEARCH_RESULTS)
    })
    .await?;

    Ok(Json(messages))
}
