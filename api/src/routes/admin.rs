//! Admin Endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use super::{with_deadline, REQUEST_DEADLINE};
use crate::{error::ApiError, services::NewProduct, AppState};

#[derive(Debug, Serialize)]
pub struct ProductAddedResponse {
    pub message: String,
    pub product_id: Uuid,
}

/// POST /admin/add_product
pub async fn add_product(
    State(state): State<AppState>,
    Json(new): Json<NewProduct>,
) -> Result<Json<ProductAddedResponse>, ApiError> {
    let product = with_deadline(REQUEST_DEADLINE, state.catalog.add_product(new)).await?;
    Ok(Json(ProductAddedResponse {
        message: "successfully added our product".to_string(),
        product_id: product.id,
    }))
}
