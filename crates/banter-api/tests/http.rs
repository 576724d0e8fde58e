use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

use banter_api::auth::{AppStateInner, FixedIdentityVerifier, JwtVerifier};
use banter_db::Database;
use banter_types::api::Claims;
use banter_types::models::Identity;

const SECRET: &str = "test-secret";

fn app() -> Router {
    let state = Arc::new(AppStateInner {
        store: Database::open_in_memory().unwrap(),
        verifier: Arc::new(JwtVerifier::new(SECRET)),
    });
    banter_api::router(state)
}

fn token(handle: &str, roles: &[&str]) -> String {
    let claims = Claims {
        sub: handle.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let request = match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_check_is_public() {
    let app = app();
    let (status, body) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_or_bad_credentials_are_rejected() {
    let app = app();

    let (status, _) = send(&app, "GET", "/channels/general/messages", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        send(&app, "GET", "/channels/general/messages", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "malformed credential");
}

#[tokio::test]
async fn post_message_validates_target() {
    let app = app();
    let alice = token("alice", &[]);

    let (status, _) = send(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({"channel": "general", "recipient": "bob", "text": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({"channel": "general", "text": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author"], "alice");
    assert_eq!(body["pinned"], false);
    assert_eq!(body["reactions"], json!({}));
}

#[tokio::test]
async fn reaction_toggle_round_trip() {
    let app = app();
    let alice = token("alice", &[]);
    let bob = token("bob", &[]);

    let (_, posted) = send(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({"channel": "general", "text": "hi"})),
    )
    .await;
    let id = posted["id"].as_str().unwrap().to_string();

    let (status, reacted) = send(
        &app,
        "POST",
        &format!("/messages/{}/reactions", id),
        Some(&bob),
        Some(json!({"emoji": "👍", "op": "add"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reacted["reactions"], json!({"👍": ["bob"]}));

    let (_, removed) = send(
        &app,
        "POST",
        &format!("/messages/{}/reactions", id),
        Some(&bob),
        Some(json!({"emoji": "👍", "op": "remove"})),
    )
    .await;
    assert_eq!(removed["reactions"], json!({}));
}

#[tokio::test]
async fn pinning_is_admin_only_and_reshapes_feeds() {
    let app = app();
    let alice = token("alice", &[]);
    let admin = token("mod", &["admin"]);

    let (_, posted) = send(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({"channel": "general", "text": "announcement"})),
    )
    .await;
    let id = posted["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/messages/{}/pin", id),
        Some(&alice),
        Some(json!({"op": "pin"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, pinned) = send(
        &app,
        "PUT",
        &format!("/messages/{}/pin", id),
        Some(&admin),
        Some(json!({"op": "pin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pinned["pinned"], true);

    let (_, feed) = send(&app, "GET", "/channels/general/messages", Some(&alice), None).await;
    assert_eq!(feed.as_array().unwrap().len(), 0);

    let (_, pins) = send(&app, "GET", "/channels/general/pins", Some(&alice), None).await;
    assert_eq!(pins.as_array().unwrap().len(), 1);
    assert_eq!(pins[0]["id"].as_str().unwrap(), id);
}

#[tokio::test]
async fn edit_and_delete_enforce_ownership() {
    let app = app();
    let alice = token("alice", &[]);
    let bob = token("bob", &[]);

    let (_, posted) = send(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({"channel": "general", "text": "original"})),
    )
    .await;
    let id = posted["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/messages/{}", id),
        Some(&bob),
        Some(json!({"text": "hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, edited) = send(
        &app,
        "PATCH",
        &format!("/messages/{}", id),
        Some(&alice),
        Some(json!({"text": "revised"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["text"], "revised");

    let (status, deleted) =
        send(&app, "DELETE", &format!("/messages/{}", id), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"], true);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/messages/{}/thread", id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn thread_returns_parent_and_replies() {
    let app = app();
    let alice = token("alice", &[]);
    let bob = token("bob", &[]);

    let (_, parent) = send(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({"channel": "general", "text": "root"})),
    )
    .await;
    let parent_id = parent["id"].as_str().unwrap().to_string();

    send(
        &app,
        "POST",
        "/messages",
        Some(&bob),
        Some(json!({"channel": "general", "text": "reply", "reply_to": parent_id})),
    )
    .await;

    let (status, thread) = send(
        &app,
        "GET",
        &format!("/messages/{}/thread", parent_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread["parent"]["text"], "root");
    assert_eq!(thread["replies"].as_array().unwrap().len(), 1);
    assert_eq!(thread["replies"][0]["text"], "reply");
}

#[tokio::test]
async fn private_conversation_is_participant_only() {
    let app = app();
    let alice = token("alice", &[]);
    let carol = token("carol", &[]);

    send(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({"recipient": "bob", "text": "psst"})),
    )
    .await;

    let (status, conversation) =
        send(&app, "GET", "/conversations/alice/bob", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conversation.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/conversations/alice/bob", Some(&carol), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn search_enforces_minimum_query_length() {
    let app = app();
    let alice = token("alice", &[]);

    let (status, _) = send(&app, "GET", "/search?q=a", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({"channel": "general", "text": "Release the fleet"})),
    )
    .await;

    let (status, hits) = send(&app, "GET", "/search?q=release", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_numeric_pagination_is_rejected() {
    let app = app();
    let alice = token("alice", &[]);

    let (status, _) = send(
        &app,
        "GET",
        "/channels/general/messages?limit=abc",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        "/channels/general/messages?offset=-1",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fixed_identity_verifier_serves_any_credential() {
    let state = Arc::new(AppStateInner {
        store: Database::open_in_memory().unwrap(),
        verifier: Arc::new(FixedIdentityVerifier::new(Identity::new("alice"))),
    });
    let app = banter_api::router(state);

    let (status, body) = send(
        &app,
        "POST",
        "/messages",
        Some("anything-at-all"),
        Some(json!({"channel": "general", "text": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author"], "alice");
}
