use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{AppState, AuthError};
use crate::error::ApiError;

/// Extract the bearer credential, run it through the injected verifier,
/// and attach the resulting identity to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::Missing)?;

    let credential = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Malformed)?;

    let identity = state.verifier.verify(credential)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
