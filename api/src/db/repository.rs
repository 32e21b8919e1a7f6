//! Repository Pattern Implementation
//!
//! Services only see these traits; the store behind them is injected when
//! `AppState` is built.
//!
//! ```text
//! AccountService ─┐
//! CartService ────┼──▶ UserRepository ────┐
//! AddressService ─┘                       ├──▶ Database (PostgreSQL)
//! CatalogService ────▶ ProductRepository ─┘     MockStore (tests)
//! ```
//!
//! # Design Decision
//!
//! Multi-step mutations (checkout, address slots, cart removal) are single
//! repository calls. The implementation runs the document rule from
//! `models` under a row lock, so the rule check and the write commit
//! together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::StoreError;
use super::models::{Address, AddressFields, AddressKind, CartItem, Order, Product, User};

/// User collection
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;
    async fn phone_exists(&self, phone: &str) -> Result<bool, StoreError>;
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Persist the latest token pair. `NotFound` if the user is gone.
    async fn update_tokens(
        &self,
        id: Uuid,
        token: &str,
        refresh_token: &str,
    ) -> Result<(), StoreError>;

    async fn push_cart_item(&self, user_id: Uuid, item: &CartItem) -> Result<(), StoreError>;

    /// Removes every entry for the product, returns how many were removed.
    async fn remove_cart_items(&self, user_id: Uuid, product_id: Uuid)
        -> Result<usize, StoreError>;

    /// Atomically: total the cart, append the order, clear the cart.
    async fn checkout(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Order, StoreError>;

    async fn add_address(
        &self,
        user_id: Uuid,
        kind: Option<AddressKind>,
        fields: &AddressFields,
    ) -> Result<Address, StoreError>;

    async fn edit_address(
        &self,
        user_id: Uuid,
        kind: AddressKind,
        fields: &AddressFields,
    ) -> Result<(), StoreError>;

    async fn clear_addresses(&self, user_id: Uuid) -> Result<(), StoreError>;
}

/// Product collection
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Case-insensitive substring match on the product name.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, StoreError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
}

/// Store liveness, used by `/health`
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

// The PostgreSQL implementation lives on `Database` in db/mod.rs.

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    use crate::db::models::RuleViolation;

    /// In-memory store. One lock over everything, so every call is atomic.
    #[derive(Default)]
    pub struct MockStore {
        users: RwLock<HashMap<Uuid, User>>,
        products: RwLock<HashMap<Uuid, Product>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn user_count(&self) -> usize {
            self.users.read().unwrap().len()
        }

        pub fn user(&self, id: Uuid) -> Option<User> {
            self.users.read().unwrap().get(&id).cloned()
        }

        fn modify<T>(
            &self,
            id: Uuid,
            apply: impl FnOnce(&mut User) -> Result<T, RuleViolation>,
        ) -> Result<T, StoreError> {
            let mut users = self.users.write().unwrap();
            let stored = users.get_mut(&id).ok_or(StoreError::NotFound)?;
            // rules run on a copy so a rejection writes nothing
            let mut draft = stored.clone();
            let out = apply(&mut draft)?;
            draft.updated_at = Utc::now();
            *stored = draft;
            Ok(out)
        }
    }

    #[async_trait]
    impl UserRepository for MockStore {
        async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
            let users = self.users.read().unwrap();
            Ok(users.values().any(|u| u.email == email))
        }

        async fn phone_exists(&self, phone: &str) -> Result<bool, StoreError> {
            let users = self.users.read().unwrap();
            Ok(users.values().any(|u| u.phone == phone))
        }

        async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
            let mut users = self.users.write().unwrap();
            if users.values().any(|u| u.email == user.email) {
                return Err(StoreError::Duplicate { field: "email" });
            }
            if users.values().any(|u| u.phone == user.phone) {
                return Err(StoreError::Duplicate { field: "phone" });
            }
            users.insert(user.id, user.clone());
            Ok(())
        }

        async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            Ok(self.user(id))
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let users = self.users.read().unwrap();
            Ok(users.values().find(|u| u.email == email).cloned())
        }

        async fn update_tokens(
            &self,
            id: Uuid,
            token: &str,
            refresh_token: &str,
        ) -> Result<(), StoreError> {
            self.modify(id, |user| {
                user.token = Some(token.to_string());
                user.refresh_token = Some(refresh_token.to_string());
                Ok(())
            })
        }

        async fn push_cart_item(&self, user_id: Uuid, item: &CartItem) -> Result<(), StoreError> {
            self.modify(user_id, |user| {
                user.cart.push(item.clone());
                Ok(())
            })
        }

        async fn remove_cart_items(
            &self,
            user_id: Uuid,
            product_id: Uuid,
        ) -> Result<usize, StoreError> {
            self.modify(user_id, |user| Ok(user.remove_from_cart(product_id)))
        }

        async fn checkout(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Order, StoreError> {
            self.modify(user_id, |user| user.checkout(now))
        }

        async fn add_address(
            &self,
            user_id: Uuid,
            kind: Option<AddressKind>,
            fields: &AddressFields,
        ) -> Result<Address, StoreError> {
            self.modify(user_id, |user| user.add_address(kind, fields.clone()))
        }

        async fn edit_address(
            &self,
            user_id: Uuid,
            kind: AddressKind,
            fields: &AddressFields,
        ) -> Result<(), StoreError> {
            self.modify(user_id, |user| user.edit_address(kind, fields.clone()))
        }

        async fn clear_addresses(&self, user_id: Uuid) -> Result<(), StoreError> {
            self.modify(user_id, |user| {
                user.addresses.clear();
                Ok(())
            })
        }
    }

    #[async_trait]
    impl ProductRepository for MockStore {
        async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
            let mut products = self.products.write().unwrap();
            products.insert(product.id, product.clone());
            Ok(())
        }

        async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
            let products = self.products.read().unwrap();
            let mut all: Vec<Product> = products.values().cloned().collect();
            all.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(all)
        }

        async fn search_products(&self, query: &str) -> Result<Vec<Product>, StoreError> {
            let needle = query.to_lowercase();
            let found = self
                .list_products()
                .await?
                .into_iter()
                .filter(|p| p.name.to_lowercase().contains(&needle))
                .collect();
            Ok(found)
        }

        async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
            let products = self.products.read().unwrap();
            Ok(products.get(&id).cloned())
        }
    }

    #[async_trait]
    impl HealthCheck for MockStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }
}
