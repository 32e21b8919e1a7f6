//! Address Service
//!
//! Each user has at most one home and one work address. Slots are a tagged
//! field on the address, not a position in the list.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::error::{ShopError, ShopResult};
use crate::db::{Address, AddressFields, AddressKind, RuleViolation, StoreError, UserRepository};

pub struct AddressService {
    users: Arc<dyn UserRepository>,
}

impl AddressService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Store a new address in `kind`'s slot, or in the first free slot.
    #[instrument(name = "address::add", skip(self, fields))]
    pub async fn add_address(
        &self,
        user_id: Uuid,
        kind: Option<AddressKind>,
        fields: AddressFields,
    ) -> ShopResult<Address> {
        check_fields(&fields)?;

        let address = self
            .users
            .add_address(user_id, kind, &fields)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ShopError::UserNotFound,
                StoreError::Rule(RuleViolation::AddressBookFull) => ShopError::TooManyAddresses,
                StoreError::Rule(RuleViolation::SlotTaken(kind)) => ShopError::SlotTaken(kind),
                e => ShopError::Store(e),
            })?;

        info!(kind = %address.kind, "address added");
        Ok(address)
    }

    #[instrument(name = "address::edit", skip(self, fields))]
    pub async fn edit_address(
        &self,
        user_id: Uuid,
        kind: AddressKind,
        fields: AddressFields,
    ) -> ShopResult<()> {
        check_fields(&fields)?;

        self.users
            .edit_address(user_id, kind, &fields)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ShopError::UserNotFound,
                StoreError::Rule(RuleViolation::NoAddress(kind)) => ShopError::AddressNotFound(kind),
                e => ShopError::Store(e),
            })
    }

    #[instrument(name = "address::delete_all", skip(self))]
    pub async fn delete_all(&self, user_id: Uuid) -> ShopResult<()> {
        self.users
            .clear_addresses(user_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ShopError::UserNotFound,
                e => ShopError::Store(e),
            })
    }
}

fn check_fields(fields: &AddressFields) -> ShopResult<()> {
    let required = [
        ("house", &fields.house),
        ("street", &fields.street),
        ("city", &fields.city),
        ("pin_code", &fields.pin_code),
    ];
    match required.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(ShopError::Validation(format!("{name} is required"))),
        None => Ok(()),
    }
}
