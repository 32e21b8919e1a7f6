//! User Endpoints
//!
//! Signup, login and the public catalog views. None of these need a token.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{with_deadline, REQUEST_DEADLINE};
use crate::{
    db::{Address, CartItem, Order, Product, User},
    error::ApiError,
    services::SignupRequest,
    types::MessageResponse,
    AppState,
};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

/// A user as returned to its owner. The password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub addresses: Vec<Address>,
    pub cart: Vec<CartItem>,
    pub orders: Vec<Order>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            token: user.token,
            refresh_token: user.refresh_token,
            addresses: user.addresses,
            cart: user.cart,
            orders: user.orders,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ============ Handlers ============

/// POST /users/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    with_deadline(REQUEST_DEADLINE, state.accounts.signup(req)).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("successfully signed up")),
    ))
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserView>, ApiError> {
    let user = with_deadline(
        REQUEST_DEADLINE,
        state.accounts.login(&req.email, &req.password),
    )
    .await?;
    Ok(Json(UserView::from(user)))
}

/// GET /users/product_view
pub async fn product_view(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = with_deadline(REQUEST_DEADLINE, state.catalog.list_products()).await?;
    Ok(Json(products))
}

/// GET /users/search?name=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let name = query.name.unwrap_or_default();
    let products = with_deadline(REQUEST_DEADLINE, state.catalog.search_products(&name)).await?;
    Ok(Json(products))
}
