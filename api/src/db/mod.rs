//! Database Module
//!
//! PostgreSQL is used as a document store: one row per user or product,
//! with the user's embedded sequences (addresses, cart, orders) kept as
//! JSONB columns.
//!
//! # Connection Pool
//!
//! `PgPool` opened once in `main`, shared through `Arc<Database>` by every
//! service, closed on shutdown.
//!
//! # Locking
//!
//! Mutations that must check a rule before writing go through
//! `Database::modify_user`: one transaction, `SELECT ... FOR UPDATE`, apply
//! the rule from `models`, write the embedded columns back, commit. A rule
//! rejection drops the transaction, which rolls it back.

mod error;
mod models;
mod repository;

pub use error::StoreError;
pub use models::*;
pub use repository::{HealthCheck, ProductRepository, UserRepository};

#[cfg(test)]
pub use repository::mock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use std::time::Duration;
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    SELECT
        id, first_name, last_name, email, phone, password_hash,
        token, refresh_token, addresses, cart, orders,
        created_at, updated_at
    FROM users
"#;

const PRODUCT_COLUMNS: &str = "SELECT id, name, price, image FROM products";

/// Row shape of the `users` table
#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    password_hash: String,
    token: Option<String>,
    refresh_token: Option<String>,
    addresses: Json<Vec<Address>>,
    cart: Json<Vec<CartItem>>,
    orders: Json<Vec<Order>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            token: row.token,
            refresh_token: row.refresh_token,
            addresses: row.addresses.0,
            cart: row.cart.0,
            orders: row.orders.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database connection and queries
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect the pool
    ///
    /// - max_connections: from config
    /// - min_connections: 1
    /// - acquire_timeout: 3s
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Apply embedded migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Wait for in-flight connections to be returned, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run a document rule against a locked user row and persist the result.
    async fn modify_user<T, F>(&self, user_id: Uuid, apply: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut User) -> Result<T, RuleViolation> + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await?;

        let sql = format!("{USER_COLUMNS} WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        let mut user = User::from(row);
        let out = apply(&mut user)?;

        sqlx::query(
            r#"
            UPDATE users
            SET addresses = $2, cart = $3, orders = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(Json(&user.addresses))
        .bind(Json(&user.cart))
        .bind(Json(&user.orders))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(out)
    }
}

fn require_row(rows_affected: u64) -> Result<(), StoreError> {
    if rows_affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

/// Escape LIKE wildcards so the query is matched literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl UserRepository for Database {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn phone_exists(&self, phone: &str) -> Result<bool, StoreError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE phone = $1)")
            .bind(phone)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, first_name, last_name, email, phone, password_hash,
                token, refresh_token, addresses, cart, orders,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.token)
        .bind(&user.refresh_token)
        .bind(Json(&user.addresses))
        .bind(Json(&user.cart))
        .bind(Json(&user.orders))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("{USER_COLUMNS} WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("{USER_COLUMNS} WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn update_tokens(
        &self,
        id: Uuid,
        token: &str,
        refresh_token: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET token = $2, refresh_token = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(refresh_token)
        .execute(&self.pool)
        .await?;

        require_row(result.rows_affected())
    }

    async fn push_cart_item(&self, user_id: Uuid, item: &CartItem) -> Result<(), StoreError> {
        // jsonb || jsonb appends the one-element array in a single statement
        let result = sqlx::query(
            r#"
            UPDATE users
            SET cart = cart || $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(Json([item]))
        .execute(&self.pool)
        .await?;

        require_row(result.rows_affected())
    }

    async fn remove_cart_items(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<usize, StoreError> {
        self.modify_user(user_id, |user| Ok(user.remove_from_cart(product_id)))
            .await
    }

    async fn checkout(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Order, StoreError> {
        self.modify_user(user_id, |user| user.checkout(now)).await
    }

    async fn add_address(
        &self,
        user_id: Uuid,
        kind: Option<AddressKind>,
        fields: &AddressFields,
    ) -> Result<Address, StoreError> {
        let fields = fields.clone();
        self.modify_user(user_id, move |user| user.add_address(kind, fields))
            .await
    }

    async fn edit_address(
        &self,
        user_id: Uuid,
        kind: AddressKind,
        fields: &AddressFields,
    ) -> Result<(), StoreError> {
        let fields = fields.clone();
        self.modify_user(user_id, move |user| user.edit_address(kind, fields))
            .await
    }

    async fn clear_addresses(&self, user_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET addresses = '[]'::jsonb, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        require_row(result.rows_affected())
    }
}

#[async_trait]
impl ProductRepository for Database {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO products (id, name, price, image) VALUES ($1, $2, $3, $4)")
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.image)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let sql = format!("{PRODUCT_COLUMNS} ORDER BY name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, StoreError> {
        let sql = format!("{PRODUCT_COLUMNS} WHERE name ILIKE $1 ORDER BY name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(like_pattern(query))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let sql = format!("{PRODUCT_COLUMNS} WHERE id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }
}

#[async_trait]
impl HealthCheck for Database {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("lamp"), "%lamp%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_require_row() {
        assert!(require_row(1).is_ok());
        assert!(matches!(require_row(0), Err(StoreError::NotFound)));
    }

    // ============ PostgreSQL ============
    //
    // Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.
    // Every row is keyed by fresh UUIDs, so the tests share one database.

    use std::sync::Arc;

    async fn test_db() -> Database {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db = Database::connect(&url, 5).await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    fn new_user() -> User {
        User::new(
            NewUser {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: format!("{}@example.com", Uuid::new_v4()),
                phone: Uuid::new_v4().simple().to_string(),
            },
            "hash".to_string(),
            Utc::now(),
        )
    }

    fn new_product(name: String, price: Price) -> Product {
        Product {
            id: Uuid::new_v4(),
            name,
            price,
            image: None,
        }
    }

    fn fields(city: &str) -> AddressFields {
        AddressFields {
            house: "12".to_string(),
            street: "Main St".to_string(),
            city: city.to_string(),
            pin_code: "10001".to_string(),
        }
    }

    #[tokio::test]
    #[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
    async fn test_pg_checkout_moves_cart_into_orders() {
        let db = test_db().await;
        let user = new_user();
        db.insert_user(&user).await.unwrap();

        let pen = new_product("Pen".to_string(), 10);
        let book = new_product("Notebook".to_string(), 25);
        for product in [&pen, &book] {
            db.insert_product(product).await.unwrap();
            db.push_cart_item(user.id, &CartItem::from(product)).await.unwrap();
        }
        assert_eq!(db.find_user(user.id).await.unwrap().unwrap().cart.len(), 2);

        let order = db.checkout(user.id, Utc::now()).await.unwrap();
        assert_eq!(order.total, 35);
        assert_eq!(order.items.len(), 2);

        let stored = db.find_user(user.id).await.unwrap().unwrap();
        assert!(stored.cart.is_empty());
        assert_eq!(stored.orders.len(), 1);
        assert_eq!(stored.orders[0].id, order.id);

        let again = db.checkout(user.id, Utc::now()).await.unwrap_err();
        assert!(matches!(again, StoreError::Rule(RuleViolation::EmptyCart)));
        assert_eq!(db.find_user(user.id).await.unwrap().unwrap().orders.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
    async fn test_pg_concurrent_add_address_keeps_two() {
        let db = Arc::new(test_db().await);
        let user = new_user();
        db.insert_user(&user).await.unwrap();
        db.add_address(user.id, None, &fields("Paris")).await.unwrap();

        let user_id = user.id;
        let racers: Vec<_> = ["Lyon", "Nice"]
            .into_iter()
            .map(|city| {
                let db = db.clone();
                tokio::spawn(async move { db.add_address(user_id, None, &fields(city)).await })
            })
            .collect();

        let mut added = 0;
        let mut rejected = 0;
        for racer in racers {
            match racer.await.unwrap() {
                Ok(address) => {
                    assert_eq!(address.kind, AddressKind::Work);
                    added += 1;
                }
                Err(StoreError::Rule(RuleViolation::AddressBookFull)) => rejected += 1,
                Err(e) => panic!("unexpected store error: {e:?}"),
            }
        }
        assert_eq!((added, rejected), (1, 1));

        let stored = db.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.addresses.len(), 2);
    }

    #[tokio::test]
    #[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
    async fn test_pg_unique_violations_name_the_field() {
        let db = test_db().await;
        let user = new_user();
        db.insert_user(&user).await.unwrap();

        let mut same_email = new_user();
        same_email.email = user.email.clone();
        assert!(matches!(
            db.insert_user(&same_email).await,
            Err(StoreError::Duplicate { field: "email" })
        ));

        let mut same_phone = new_user();
        same_phone.phone = user.phone.clone();
        assert!(matches!(
            db.insert_user(&same_phone).await,
            Err(StoreError::Duplicate { field: "phone" })
        ));
    }

    #[tokio::test]
    #[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
    async fn test_pg_search_matches_wildcards_literally() {
        let db = test_db().await;
        let tag = Uuid::new_v4().simple().to_string();
        db.insert_product(&new_product(format!("{tag} 50% off"), 5))
            .await
            .unwrap();
        db.insert_product(&new_product(format!("{tag} 500 off"), 5))
            .await
            .unwrap();

        let literal = db.search_products(&format!("{tag} 50%")).await.unwrap();
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].name, format!("{tag} 50% off"));

        let any_case = db.search_products(&tag.to_uppercase()).await.unwrap();
        assert_eq!(any_case.len(), 2);
    }
}
