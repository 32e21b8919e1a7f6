//! Address Endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use super::{owned_user, with_deadline, REQUEST_DEADLINE};
use crate::{
    db::{Address, AddressFields, AddressKind},
    error::ApiError,
    middleware::AuthUser,
    types::{MessageResponse, UserQuery},
    AppState,
};

/// Body of POST /addaddress. `kind` is optional; without it the first
/// free slot is used.
#[derive(Debug, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub kind: Option<AddressKind>,
    #[serde(flatten)]
    pub fields: AddressFields,
}

/// POST /addaddress?id=
pub async fn add_address(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
    let user_id = owned_user(&query, &auth)?;
    let address = with_deadline(
        REQUEST_DEADLINE,
        state.addresses.add_address(user_id, input.kind, input.fields),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// PUT /edithomeaddress?id=
pub async fn edit_home_address(
    state: State<AppState>,
    auth: Extension<AuthUser>,
    query: Query<UserQuery>,
    fields: Json<AddressFields>,
) -> Result<Json<MessageResponse>, ApiError> {
    edit_address(state, auth, query, fields, AddressKind::Home).await
}

/// PUT /editworkaddress?id=
pub async fn edit_work_address(
    state: State<AppState>,
    auth: Extension<AuthUser>,
    query: Query<UserQuery>,
    fields: Json<AddressFields>,
) -> Result<Json<MessageResponse>, ApiError> {
    edit_address(state, auth, query, fields, AddressKind::Work).await
}

/// GET|DELETE /deleteaddresses?id=
pub async fn delete_addresses(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = owned_user(&query, &auth)?;
    with_deadline(REQUEST_DEADLINE, state.addresses.delete_all(user_id)).await?;
    Ok(Json(MessageResponse::new("successfully deleted")))
}

// ============ Helpers ============

async fn edit_address(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UserQuery>,
    Json(fields): Json<AddressFields>,
    kind: AddressKind,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = owned_user(&query, &auth)?;
    with_deadline(
        REQUEST_DEADLINE,
        state.addresses.edit_address(user_id, kind, fields),
    )
    .await?;
    Ok(Json(MessageResponse::new(format!(
        "successfully updated the {kind} address"
    ))))
}

