//! Account Service
//!
//! Signup and login. Passwords are hashed on the blocking pool; login never
//! says which of email or password was wrong.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::auth::TokenService;
use super::error::{ShopError, ShopResult};
use super::password::{hash_password, verify_dummy, verify_password};
use crate::db::{NewUser, StoreError, User, UserRepository};

/// Signup payload
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=30;
    const MIN_PASSWORD_LEN: usize = 6;

    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Create an account with an empty cart, address book and order history.
    ///
    /// The email and phone checks run before hashing so duplicates fail fast;
    /// the unique constraints still catch a concurrent signup that slips past.
    #[instrument(name = "account::signup", skip_all, fields(email = %req.email))]
    pub async fn signup(&self, req: SignupRequest) -> ShopResult<User> {
        let req = Self::normalize(req);
        Self::validate(&req)?;

        if self.users.email_exists(&req.email).await? {
            return Err(ShopError::EmailTaken);
        }
        if self.users.phone_exists(&req.phone).await? {
            return Err(ShopError::PhoneTaken);
        }

        let password = req.password;
        let password_hash = blocking(move || hash_password(&password)).await?;

        let profile = NewUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
        };
        let mut user = User::new(profile, password_hash, Utc::now());

        let pair = self
            .tokens
            .issue(&user.email, &user.first_name, &user.last_name, user.id)
            .map_err(|e| ShopError::Internal(e.to_string()))?;
        user.token = Some(pair.token);
        user.refresh_token = Some(pair.refresh_token);

        self.users.insert_user(&user).await.map_err(|e| match e {
            StoreError::Duplicate { field: "phone" } => ShopError::PhoneTaken,
            StoreError::Duplicate { .. } => ShopError::EmailTaken,
            other => ShopError::Store(other),
        })?;

        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    /// Verify credentials and hand back the user with a fresh token pair.
    ///
    /// Persisting the pair is best effort: a failed write is logged and the
    /// login still succeeds.
    #[instrument(name = "account::login", skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> ShopResult<User> {
        let email = email.trim().to_lowercase();
        let Some(mut user) = self.users.find_user_by_email(&email).await? else {
            let candidate = password.to_string();
            blocking(move || verify_dummy(&candidate)).await?;
            return Err(ShopError::InvalidCredentials);
        };

        let stored = user.password_hash.clone();
        let candidate = password.to_string();
        if !blocking(move || verify_password(&stored, &candidate)).await? {
            return Err(ShopError::InvalidCredentials);
        }

        let pair = self
            .tokens
            .issue(&user.email, &user.first_name, &user.last_name, user.id)
            .map_err(|e| ShopError::Internal(e.to_string()))?;

        if let Err(e) = self
            .users
            .update_tokens(user.id, &pair.token, &pair.refresh_token)
            .await
        {
            warn!(user_id = %user.id, error = %e, "failed to persist issued tokens");
        }

        user.token = Some(pair.token);
        user.refresh_token = Some(pair.refresh_token);
        info!(user_id = %user.id, "login succeeded");
        Ok(user)
    }

    fn normalize(mut req: SignupRequest) -> SignupRequest {
        req.first_name = req.first_name.trim().to_string();
        req.last_name = req.last_name.trim().to_string();
        req.email = req.email.trim().to_lowercase();
        req.phone = req.phone.trim().to_string();
        req
    }

    fn validate(req: &SignupRequest) -> ShopResult<()> {
        if !Self::NAME_LEN.contains(&req.first_name.chars().count()) {
            return Err(ShopError::Validation(
                "first_name must be 2 to 30 characters".to_string(),
            ));
        }
        if !Self::NAME_LEN.contains(&req.last_name.chars().count()) {
            return Err(ShopError::Validation(
                "last_name must be 2 to 30 characters".to_string(),
            ));
        }
        match req.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(ShopError::Validation("email is invalid".to_string())),
        }
        if req.phone.is_empty() {
            return Err(ShopError::Validation("phone is required".to_string()));
        }
        if req.password.chars().count() < Self::MIN_PASSWORD_LEN {
            return Err(ShopError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        Ok(())
    }
}

async fn blocking<T, F>(f: F) -> ShopResult<T>
where
    F: FnOnce() -> ShopResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ShopError::Internal(format!("blocking task failed: {e}")))?
}
