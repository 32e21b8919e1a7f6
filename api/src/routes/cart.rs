//! Cart Endpoints
//!
//! All routes here sit behind the token guard and take ids from the query
//! string (`id` = product or user, `userID` = user).

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::{owned_user, with_deadline, INSTANT_BUY_DEADLINE, REQUEST_DEADLINE};
use crate::{
    db::Order,
    error::ApiError,
    middleware::AuthUser,
    services::{parse_product_id, parse_user_id, CartView},
    types::{required, MessageResponse, ProductUserQuery, UserQuery},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub message: String,
    pub order: Order,
}

/// GET /addtocart?id=&userID=
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ProductUserQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (product_id, user_id) = product_and_user(&query, &auth)?;
    with_deadline(REQUEST_DEADLINE, state.carts.add_to_cart(product_id, user_id)).await?;
    Ok(Json(MessageResponse::new("successfully added to the cart")))
}

/// GET /removeitem?id=&userID=
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ProductUserQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (product_id, user_id) = product_and_user(&query, &auth)?;
    with_deadline(
        REQUEST_DEADLINE,
        state.carts.remove_from_cart(product_id, user_id),
    )
    .await?;
    Ok(Json(MessageResponse::new("successfully removed from the cart")))
}

/// GET /listcart?id=
pub async fn list_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
) -> Result<Json<CartView>, ApiError> {
    let user_id = owned_user(&query, &auth)?;
    let cart = with_deadline(REQUEST_DEADLINE, state.carts.get_cart(user_id)).await?;
    Ok(Json(cart))
}

/// GET /cartcheckout?id=
pub async fn checkout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
) -> Result<Json<OrderResponse>, ApiError> {
    let user_id = owned_user(&query, &auth)?;
    let order = with_deadline(REQUEST_DEADLINE, state.carts.checkout(user_id)).await?;
    Ok(Json(OrderResponse {
        message: "successfully placed the order".to_string(),
        order,
    }))
}

/// GET /instantbuy?id=&userID=
pub async fn instant_buy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ProductUserQuery>,
) -> Result<Json<OrderResponse>, ApiError> {
    let (product_id, user_id) = product_and_user(&query, &auth)?;
    let order = with_deadline(
        INSTANT_BUY_DEADLINE,
        state.carts.instant_buy(product_id, user_id),
    )
    .await?;
    Ok(Json(OrderResponse {
        message: "successfully placed the order".to_string(),
        order,
    }))
}

// ============ Helpers ============

fn product_and_user(query: &ProductUserQuery, auth: &AuthUser) -> Result<(Uuid, Uuid), ApiError> {
    let product_id = parse_product_id(required(&query.id, "product id")?)?;
    let user_id = parse_user_id(required(&query.user_id, "user id")?)?;
    auth.ensure_owner(user_id)?;
    Ok((product_id, user_id))
}

