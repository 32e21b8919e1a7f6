//! Token Authentication
//!
//! Reads the access token from the `token` header, falling back to
//! `Authorization: Bearer <token>`. A valid token puts an [`AuthUser`] into
//! the request extensions; anything else stops the request with 401.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{error::ApiError, services::TokenError, AppState};

pub const TOKEN_HEADER: &str = "token";

/// Identity taken from a validated access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

impl AuthUser {
    /// The user id in the query string must be the token's own.
    pub fn ensure_owner(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            tracing::warn!(token_user = %self.user_id, requested = %user_id, "user id mismatch");
            Err(ApiError::Forbidden)
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("no authorization header provided".to_string()))?;

    let claims = state.tokens.validate(token).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        ApiError::Unauthorized(rejection_message(&e).to_string())
    })?;
    let user_id = claims
        .user_id()
        .map_err(|e| ApiError::Unauthorized(rejection_message(&e).to_string()))?;

    request.extensions_mut().insert(AuthUser {
        user_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

// ============ Helpers ============

fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let direct = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty());

    direct.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

fn rejection_message(err: &TokenError) -> &'static str {
    match err {
        TokenError::Expired => "token is expired",
        TokenError::InvalidSignature => "the token is invalid",
        TokenError::Malformed | TokenError::Signing(_) => "the token is malformed",
    }
}
