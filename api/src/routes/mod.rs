//! API Routes Module
//!
//! # Routes
//! - `/health`: health check
//! - `/users/*`: signup, login, catalog listing and search (public)
//! - `/admin/add_product`: catalog insert (public)
//! - `/addtocart`, `/removeitem`, `/listcart`, `/cartcheckout`, `/instantbuy`:
//!   cart and orders (token required)
//! - `/addaddress`, `/edithomeaddress`, `/editworkaddress`, `/deleteaddresses`:
//!   address book (token required)

pub mod address;
pub mod admin;
pub mod cart;
pub mod health;
pub mod users;

use std::future::Future;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{auth::TOKEN_HEADER, require_auth, AuthUser},
    services::{parse_user_id, ShopResult},
    types::{required, UserQuery},
    AppState,
};

/// Upper bound on a handler's store work.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(100);
pub const INSTANT_BUY_DEADLINE: Duration = Duration::from_secs(5);

/// Build the application router
///
/// # Route Structure
///
/// ```text
/// GET        /health                      - server and store status
///
/// POST       /users/signup                - create an account
/// POST       /users/login                 - issue tokens
/// GET        /users/product_view          - every product
/// GET        /users/search?name=          - name search
/// POST       /admin/add_product           - catalog insert
///
/// GET        /addtocart?id=&userID=       - [auth] append product to cart
/// GET        /removeitem?id=&userID=      - [auth] drop product from cart
/// GET        /listcart?id=                - [auth] cart and total
/// GET        /cartcheckout?id=            - [auth] order the cart
/// GET        /instantbuy?id=&userID=      - [auth] order the cart from a product page
///
/// POST       /addaddress?id=              - [auth] new address
/// PUT        /edithomeaddress?id=         - [auth] overwrite home address
/// PUT        /editworkaddress?id=         - [auth] overwrite work address
/// GET|DELETE /deleteaddresses?id=         - [auth] clear address book
/// ```
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    let guarded = Router::new()
        .route("/addtocart", get(cart::add_to_cart))
        .route("/removeitem", get(cart::remove_item))
        .route("/listcart", get(cart::list_cart))
        .route("/cartcheckout", get(cart::checkout))
        .route("/instantbuy", get(cart::instant_buy))
        .route("/addaddress", post(address::add_address))
        .route("/edithomeaddress", put(address::edit_home_address))
        .route("/editworkaddress", put(address::edit_work_address))
        .route(
            "/deleteaddresses",
            get(address::delete_addresses).delete(address::delete_addresses),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/users/signup", post(users::signup))
        .route("/users/login", post(users::login))
        .route("/users/product_view", get(users::product_view))
        .route("/users/search", get(users::search))
        .route("/admin/add_product", post(admin::add_product))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Production only allows `ALLOWED_ORIGINS`; development allows local
/// frontends with any method and header.
fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_production() {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static(TOKEN_HEADER),
            ])
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

// ============ Helpers ============

/// Run a service call under a deadline. Expiry is a 500 `Timeout`.
pub(crate) async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, ApiError>
where
    F: Future<Output = ShopResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(ApiError::Timeout),
    }
}

/// `?id=` as a user id that must belong to the caller.
pub(crate) fn owned_user(query: &UserQuery, auth: &AuthUser) -> Result<Uuid, ApiError> {
    let user_id = parse_user_id(required(&query.id, "user id")?)?;
    auth.ensure_owner(user_id)?;
    Ok(user_id)
}
