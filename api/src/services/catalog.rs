//! Catalog Service
//!
//! Admin product insert, full listing and name search.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::error::{ShopError, ShopResult};
use crate::db::{Price, Product, ProductRepository};

/// Product payload for the admin insert
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
}

pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    /// Highest accepted price in minor units. Keeps any realistic cart total
    /// far from `Price` overflow.
    pub const MAX_PRICE: Price = i32::MAX as Price;

    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    #[instrument(name = "catalog::add", skip(self), fields(name = %new.name))]
    pub async fn add_product(&self, new: NewProduct) -> ShopResult<Product> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ShopError::Validation("name is required".to_string()));
        }
        if new.price < 0 {
            return Err(ShopError::Validation("price cannot be negative".to_string()));
        }
        if new.price > Self::MAX_PRICE {
            return Err(ShopError::Validation(format!(
                "price cannot exceed {}",
                Self::MAX_PRICE
            )));
        }

        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: new.price,
            image: new.image.filter(|image| !image.trim().is_empty()),
        };
        self.products.insert_product(&product).await?;

        info!(product_id = %product.id, "product added");
        Ok(product)
    }

    pub async fn list_products(&self) -> ShopResult<Vec<Product>> {
        Ok(self.products.list_products().await?)
    }

    /// A blank query is an error, never a full listing.
    #[instrument(name = "catalog::search", skip(self))]
    pub async fn search_products(&self, query: &str) -> ShopResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ShopError::InvalidQuery);
        }
        Ok(self.products.search_products(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockStore;

    fn new_product(name: &str, price: Price) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let catalog = CatalogService::new(Arc::new(MockStore::new()));
        let lamp = catalog.add_product(new_product("Lamp", 40)).await.unwrap();
        catalog.add_product(new_product("Desk", 200)).await.unwrap();

        let all = catalog.list_products().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&lamp));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_products() {
        let catalog = CatalogService::new(Arc::new(MockStore::new()));
        assert!(matches!(
            catalog.add_product(new_product("  ", 40)).await,
            Err(ShopError::Validation(_))
        ));
        assert!(matches!(
            catalog.add_product(new_product("Lamp", -1)).await,
            Err(ShopError::Validation(_))
        ));
        assert!(catalog.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_cap() {
        let catalog = CatalogService::new(Arc::new(MockStore::new()));
        assert!(matches!(
            catalog.add_product(new_product("Yacht", i64::MAX)).await,
            Err(ShopError::Validation(_))
        ));
        assert!(matches!(
            catalog
                .add_product(new_product("Yacht", CatalogService::MAX_PRICE + 1))
                .await,
            Err(ShopError::Validation(_))
        ));

        let top = catalog
            .add_product(new_product("Island", CatalogService::MAX_PRICE))
            .await
            .unwrap();
        assert_eq!(top.price, CatalogService::MAX_PRICE);
    }

    #[tokio::test]
    async fn test_search_is_substring_and_case_insensitive() {
        let catalog = CatalogService::new(Arc::new(MockStore::new()));
        catalog.add_product(new_product("Desk Lamp", 40)).await.unwrap();
        catalog.add_product(new_product("Floor lamp", 90)).await.unwrap();
        catalog.add_product(new_product("Desk", 200)).await.unwrap();

        let found = catalog.search_products("LAMP").await.unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Desk Lamp", "Floor lamp"]);
    }

    #[tokio::test]
    async fn test_empty_search_is_rejected() {
        let catalog = CatalogService::new(Arc::new(MockStore::new()));
        catalog.add_product(new_product("Desk", 200)).await.unwrap();

        assert!(matches!(catalog.search_products("").await, Err(ShopError::InvalidQuery)));
        assert!(matches!(catalog.search_products("   ").await, Err(ShopError::InvalidQuery)));
    }
}
