//! Bearer token authentication module
//!
//! Provides the `Authorized` extractor for Axum handlers. When a secret token
//! is configured every protected request must carry
//! `Authorization: Bearer <token>`:
//! - header absent or not using the Bearer scheme → 401
//! - token present but wrong → 403
//!
//! With no token configured every request is let through.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::ApiError;
use crate::state::AppState;

/// Shared secret the ekey controller sends as a bearer token.
///
/// Wiped from memory on drop and redacted in `Debug` output.
pub struct SecretToken(Zeroizing<String>);

impl SecretToken {
    /// Wrap a configured token. An empty token means "no authentication".
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(Zeroizing::new(token)))
        }
    }

    /// Exact byte comparison in constant time.
    pub fn matches(&self, provided: &str) -> bool {
        let expected = self.0.as_bytes();
        let provided = provided.as_bytes();
        expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretToken").field(&"[REDACTED]").finish()
    }
}

/// Extract the Bearer token from the Authorization header
fn extract_bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?;

    auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer scheme"))
}

/// Check a request against the configured token.
pub fn authorize(parts: &Parts, expected: Option<&SecretToken>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let token = extract_bearer_token(parts)?;
    if expected.matches(token) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Invalid secret token"))
    }
}

/// Extractor guarding webhook and admin handlers.
///
/// Runs before the body is read, so rejected requests are never parsed.
pub struct Authorized;

impl FromRequestParts<AppState> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state.secret_token.as_deref())?;
        Ok(Authorized)
    }
}
