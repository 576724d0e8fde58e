use std::sync::Arc;

use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use thiserror::Error;

use banter_db::Database;
use banter_types::api::Claims;
use banter_types::models::Identity;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Database,
    pub verifier: Arc<dyn ClaimsVerifier>,
}

/// Ways a credential can fail verification. All surface as 401 with
/// distinct messages.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    Missing,

    #[error("malformed credential")]
    Malformed,

    #[error("credential expired")]
    Expired,

    #[error("invalid credential")]
    Invalid,
}

/// Turns an opaque credential into verified identity claims. The
/// implementation is chosen once at startup wiring; request handling
/// never branches on deployment mode.
pub trait ClaimsVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<Identity, AuthError>;
}

/// HS256 JWT adapter. Tokens are issued by the external user service;
/// this side only verifies the signature and expiry.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

impl ClaimsVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        let data =
            decode::<Claims>(credential, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    ErrorKind::InvalidToken
                    | ErrorKind::Base64(_)
                    | ErrorKind::Json(_)
                    | ErrorKind::Utf8(_) => AuthError::Malformed,
                    _ => AuthError::Invalid,
                }
            })?;

        Ok(Identity {
            handle: data.claims.sub,
            roles: data.claims.roles,
        })
    }
}

/// Test double: every credential verifies to one fixed identity.
pub struct FixedIdentityVerifier {
    identity: Identity,
}

impl FixedIdentityVerifier {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

impl ClaimsVerifier for FixedIdentityVerifier {
    fn verify(&self, _credential: &str) -> Result<Identity, AuthError> {
        Ok(self.identity.clone())
    }
}
