//! E-commerce Backend API Library
//!
//! # Overview
//!
//! Accounts, catalog, cart, addresses and cash-on-delivery checkout over
//! HTTP JSON, with PostgreSQL as the document store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          API                             │
//! │                                                          │
//! │  ┌─────────┐  ┌────────────┐  ┌──────────┐  ┌─────────┐  │
//! │  │ Routes  │─▶│ Middleware │─▶│ Services │─▶│   DB    │  │
//! │  └─────────┘  └────────────┘  └──────────┘  └────┬────┘  │
//! │                                                  │       │
//! └──────────────────────────────────────────────────┼───────┘
//!                                                    ▼
//!                                           ┌────────────────┐
//!                                           │   PostgreSQL   │
//!                                           │ users/products │
//!                                           └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: environment settings
//! - `error`: HTTP error mapping
//! - `routes`: endpoint handlers and router
//! - `middleware`: token authentication
//! - `services`: business rules (accounts, cart, addresses, catalog, tokens)
//! - `db`: store traits, documents and the PostgreSQL implementation
//! - `types`: shared request/response types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shop_api::{config::Config, db::Database, routes, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config.database_url, config.db_max_connections).await?;
//!     let app = routes::create_router(AppState::new(std::sync::Arc::new(db), config));
//!     // ... serve `app`
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod types;

pub use config::Config;
pub use db::Database;
pub use error::ApiError;

use db::{HealthCheck, ProductRepository, UserRepository};
use services::{AccountService, AddressService, CartService, CatalogService, TokenService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub carts: Arc<CartService>,
    pub addresses: Arc<AddressService>,
    pub catalog: Arc<CatalogService>,
    pub tokens: Arc<TokenService>,
    pub health: Arc<dyn HealthCheck>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every service to one store.
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: UserRepository + ProductRepository + HealthCheck + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let products: Arc<dyn ProductRepository> = store.clone();
        let tokens = Arc::new(TokenService::new(config.secret_key.as_bytes()));

        Self {
            accounts: Arc::new(AccountService::new(users.clone(), tokens.clone())),
            carts: Arc::new(CartService::new(users.clone(), products.clone())),
            addresses: Arc::new(AddressService::new(users)),
            catalog: Arc::new(CatalogService::new(products)),
            tokens,
            health: store,
            config: Arc::new(config),
        }
    }
}
