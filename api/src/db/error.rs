//! Store Errors
//!
//! Everything a repository call can fail with. Services translate these into
//! their own domain errors before anything reaches the HTTP layer.

use thiserror::Error;

use super::models::RuleViolation;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No document with the requested key
    #[error("document not found")]
    NotFound,

    /// Unique constraint hit (`field` is "email" or "phone")
    #[error("duplicate value for {field}")]
    Duplicate { field: &'static str },

    /// Mutation rejected by a document rule; nothing was written
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                match db_err.constraint() {
                    Some("users_email_unique") => return StoreError::Duplicate { field: "email" },
                    Some("users_phone_unique") => return StoreError::Duplicate { field: "phone" },
                    _ => {}
                }
            }
        }
        StoreError::Database(err)
    }
}
