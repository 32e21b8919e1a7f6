//! Services Module
//!
//! Business logic layer. Each service gets its store handles at
//! construction and never reaches for a global.
//!
//! # Services
//! - `AccountService`: signup, login
//! - `CartService`: cart mutation, checkout, instant buy
//! - `AddressService`: home/work address book
//! - `CatalogService`: product insert, listing, search
//! - `TokenService`: signed session tokens

mod account;
mod address;
mod auth;
mod cart;
mod catalog;
mod error;
mod password;

pub use account::{AccountService, SignupRequest};
pub use address::AddressService;
pub use auth::{Claims, RefreshClaims, TokenError, TokenPair, TokenService};
pub use cart::{CartService, CartView};
pub use catalog::{CatalogService, NewProduct};
pub use error::{ShopError, ShopResult};
pub use password::{hash_password, verify_password};

use uuid::Uuid;

/// Parse a user id taken from a request.
pub fn parse_user_id(raw: &str) -> ShopResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ShopError::UserNotValid)
}

/// Parse a product id taken from a request.
pub fn parse_product_id(raw: &str) -> ShopResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ShopError::ProductNotValid)
}
