//! Token Service
//!
//! Issues and validates the signed session tokens.
//!
//! # Token Pair
//!
//! ```text
//! access  (HS256, 24h)  : sub = user id, email, first_name, last_name, iat, exp
//! refresh (HS384, 168h) : sub = user id, iat, exp
//! ```
//!
//! Both are signed with the single shared secret from `SECRET_KEY`. The
//! service holds no state besides the keys; the latest pair is written back
//! onto the user record by `AccountService` at login.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }
}

/// Refresh token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed")]
    Malformed,

    #[error("token is expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub const ACCESS_TTL_HOURS: i64 = 24;
    pub const REFRESH_TTL_HOURS: i64 = 168;

    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a fresh access/refresh pair valid from now.
    pub fn issue(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        user_id: Uuid,
    ) -> Result<TokenPair, TokenError> {
        self.issue_at(email, first_name, last_name, user_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(Self::ACCESS_TTL_HOURS)).timestamp(),
        };
        let refresh_claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(Self::REFRESH_TTL_HOURS)).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        let refresh_token = encode(&Header::new(Algorithm::HS384), &refresh_claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(TokenPair {
            token,
            refresh_token,
        })
    }

    /// Verify signature and expiry of an access token.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret")
    }

    #[test]
    fn test_issue_and_validate_roundtrip() {
        let tokens = service();
        let uid = Uuid::new_v4();
        let pair = tokens.issue("ada@example.com", "Ada", "Lovelace", uid).unwrap();

        let claims = tokens.validate(&pair.token).unwrap();
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.user_id().unwrap(), uid);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_ne!(pair.token, pair.refresh_token);
    }

    #[test]
    fn test_expired_token() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(25);
        let pair = tokens
            .issue_at("ada@example.com", "Ada", "Lovelace", Uuid::new_v4(), issued)
            .unwrap();

        assert_eq!(tokens.validate(&pair.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let pair = TokenService::new(b"other-secret")
            .issue("ada@example.com", "Ada", "Lovelace", Uuid::new_v4())
            .unwrap();

        assert_eq!(service().validate(&pair.token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(service().validate("not-a-token"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let tokens = service();
        let pair = tokens
            .issue("ada@example.com", "Ada", "Lovelace", Uuid::new_v4())
            .unwrap();

        assert_eq!(tokens.validate(&pair.refresh_token), Err(TokenError::Malformed));
    }
}
