//! Cart / Order Service
//!
//! # Flow
//!
//! ```text
//! add_to_cart   : catalog lookup ──▶ snapshot ──▶ append to user.cart
//! remove        : drop every entry of the product from user.cart
//! checkout      : [lock user] total ──▶ append order ──▶ clear cart [commit]
//! instant_buy   : product must exist, then checkout of the whole cart
//! ```
//!
//! Identical products accumulate as separate line items; there is no
//! quantity field.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::error::{ShopError, ShopResult};
use crate::db::{
    CartItem, Order, Price, Product, ProductRepository, RuleViolation, StoreError, UserRepository,
};

/// Cart contents with the computed total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub total: Price,
    pub items: Vec<CartItem>,
}

pub struct CartService {
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CartService {
    pub fn new(users: Arc<dyn UserRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { users, products }
    }

    #[instrument(name = "cart::add", skip(self))]
    pub async fn add_to_cart(&self, product_id: Uuid, user_id: Uuid) -> ShopResult<CartItem> {
        let product = self.product(product_id).await?;
        let item = CartItem::from(&product);

        self.users
            .push_cart_item(user_id, &item)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ShopError::UserNotFound,
                e => ShopError::CartUpdateFailed(e),
            })?;

        info!(price = item.price, "product added to cart");
        Ok(item)
    }

    /// Removes all entries of the product. Returns how many were removed.
    #[instrument(name = "cart::remove", skip(self))]
    pub async fn remove_from_cart(&self, product_id: Uuid, user_id: Uuid) -> ShopResult<usize> {
        let removed = self
            .users
            .remove_cart_items(user_id, product_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ShopError::UserNotFound,
                e => ShopError::RemoveFailed(e),
            })?;

        info!(removed, "cart entries removed");
        Ok(removed)
    }

    #[instrument(name = "cart::get", skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> ShopResult<CartView> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(ShopError::UserNotFound)?;

        let total = user.cart_total().ok_or_else(total_overflow)?;

        Ok(CartView {
            total,
            items: user.cart,
        })
    }

    /// Convert the whole cart into one cash-on-delivery order.
    ///
    /// The store applies this as a single transaction: either the order is
    /// recorded and the cart cleared, or nothing changes.
    #[instrument(name = "cart::checkout", skip(self))]
    pub async fn checkout(&self, user_id: Uuid) -> ShopResult<Order> {
        let order = self
            .users
            .checkout(user_id, Utc::now())
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ShopError::UserNotFound,
                StoreError::Rule(RuleViolation::EmptyCart) => ShopError::EmptyCart,
                StoreError::Rule(RuleViolation::TotalOverflow) => total_overflow(),
                e => ShopError::BuyFailed(e),
            })?;

        info!(order_id = %order.id, total = order.total, items = order.items.len(), "order placed");
        Ok(order)
    }

    /// Checkout triggered from a product page.
    ///
    /// The product must exist, but the order covers the whole current cart,
    /// not only that product.
    #[instrument(name = "cart::instant_buy", skip(self))]
    pub async fn instant_buy(&self, product_id: Uuid, user_id: Uuid) -> ShopResult<Order> {
        self.product(product_id).await?;
        self.checkout(user_id).await
    }

    async fn product(&self, product_id: Uuid) -> ShopResult<Product> {
        self.products
            .find_product(product_id)
            .await?
            .ok_or(ShopError::ProductNotFound)
    }
}

fn total_overflow() -> ShopError {
    ShopError::Validation("cart total overflows".to_string())
}
