//! Middleware Module
//!
//! # Layers
//! - `auth::require_auth`: token check for the cart and address routes

pub mod auth;

pub use auth::{require_auth, AuthUser};
