//! Service Errors
//!
//! The fixed set of domain failures a service operation can report.
//! Store errors are folded into these before leaving the service layer.

use thiserror::Error;

use crate::db::{AddressKind, StoreError};

#[derive(Debug, Error)]
pub enum ShopError {
    // ============ Input ============
    #[error("this user is not valid")]
    UserNotValid,

    #[error("invalid product id")]
    ProductNotValid,

    #[error("invalid search query")]
    InvalidQuery,

    #[error("{0}")]
    Validation(String),

    // ============ Lookups ============
    #[error("can't find the product")]
    ProductNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("no {0} address on file")]
    AddressNotFound(AddressKind),

    // ============ Rules ============
    #[error("user already exists")]
    EmailTaken,

    #[error("this phone number is already in use")]
    PhoneTaken,

    #[error("login or password incorrect")]
    InvalidCredentials,

    #[error("cart is empty")]
    EmptyCart,

    #[error("address slots are full")]
    TooManyAddresses,

    #[error("{0} address slot is already taken")]
    SlotTaken(AddressKind),

    // ============ Writes ============
    #[error("can't add this product to the cart")]
    CartUpdateFailed(#[source] StoreError),

    #[error("can't remove this item from the cart")]
    RemoveFailed(#[source] StoreError),

    #[error("can't update the purchase")]
    BuyFailed(#[source] StoreError),

    // ============ Everything else ============
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ShopResult<T> = Result<T, ShopError>;
