//! Password hashing (argon2id, random salt per hash).
//!
//! Both functions are CPU-bound; async callers run them on the blocking pool.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, error, instrument};

use super::error::ShopError;

#[instrument(name = "password::hash", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, ShopError> {
    if password.is_empty() {
        return Err(ShopError::Validation("password cannot be empty".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hashing failed");
            ShopError::Internal(format!("password hashing failed: {e}"))
        })
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
#[instrument(name = "password::verify", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<bool, ShopError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "stored password hash does not parse");
        ShopError::Internal(format!("invalid stored password hash: {e}"))
    })?;

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => {
            debug!("password mismatch");
            Ok(false)
        }
        Err(e) => Err(ShopError::Internal(format!("password verification failed: {e}"))),
    }
}

/// Hash checked when login finds no account, so an unknown email costs the
/// same argon2 work as a wrong password.
pub(super) static DUMMY_HASH: OnceLock<String> = OnceLock::new();

pub fn verify_dummy(candidate: &str) -> Result<(), ShopError> {
    let hash = match DUMMY_HASH.get() {
        Some(hash) => hash,
        None => {
            let fresh = hash_password("no-account-placeholder")?;
            DUMMY_HASH.get_or_init(|| fresh)
        }
    };
    verify_password(hash, candidate).map(|_| ())
}
