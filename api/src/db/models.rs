//! Database Models
//!
//! Document models for the two collections (users, products).
//! A user row embeds its addresses, cart and order history; the rules that
//! mutate those embedded sequences live here so every store applies them the
//! same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Integer price in minor currency units.
pub type Price = i64;

// ============ Catalog ============

/// Catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
}

/// Cart line item
///
/// Snapshot of a product taken when it was added. Catalog price changes
/// made afterwards never reach carts that already hold the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
        }
    }
}

/// Sum of line-item prices, `None` on overflow.
pub fn cart_total(items: &[CartItem]) -> Option<Price> {
    items
        .iter()
        .try_fold(0 as Price, |acc, item| acc.checked_add(item.price))
}

// ============ Orders ============

/// Placed order (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub ordered_at: DateTime<Utc>,
    /// Cash on delivery is the only payment method modeled.
    pub cash_on_delivery: bool,
    pub total: Price,
    /// Cart contents at purchase time.
    pub items: Vec<CartItem>,
}

// ============ Addresses ============

/// Address slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Home,
    Work,
}

impl AddressKind {
    /// Slots in the order they are filled when the caller does not pick one.
    pub const ALL: [AddressKind; 2] = [AddressKind::Home, AddressKind::Work];

    pub fn as_str(self) -> &'static str {
        match self {
            AddressKind::Home => "home",
            AddressKind::Work => "work",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable address fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub house: String,
    pub street: String,
    pub city: String,
    pub pin_code: String,
}

/// Stored address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub kind: AddressKind,
    #[serde(flatten)]
    pub fields: AddressFields,
}

// ============ Users ============

/// Profile data supplied at signup
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// User document
///
/// Not `Serialize`: the password hash must never reach a response body.
/// Routes build their own views from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub addresses: Vec<Address>,
    pub cart: Vec<CartItem>,
    pub orders: Vec<Order>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Business rule rejected a document mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("cart is empty")]
    EmptyCart,

    #[error("cart total overflows")]
    TotalOverflow,

    #[error("both address slots are taken")]
    AddressBookFull,

    #[error("{0} address slot is already taken")]
    SlotTaken(AddressKind),

    #[error("no {0} address on file")]
    NoAddress(AddressKind),
}

impl User {
    /// Fresh account with empty cart, addresses and order history.
    pub fn new(profile: NewUser, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            phone: profile.phone,
            password_hash,
            token: None,
            refresh_token: None,
            addresses: Vec::new(),
            cart: Vec::new(),
            orders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn address(&self, kind: AddressKind) -> Option<&Address> {
        self.addresses.iter().find(|a| a.kind == kind)
    }

    /// Store an address in the requested slot, or the first free one.
    pub fn add_address(
        &mut self,
        kind: Option<AddressKind>,
        fields: AddressFields,
    ) -> Result<Address, RuleViolation> {
        let kind = match kind {
            Some(kind) if self.address(kind).is_some() => {
                return Err(RuleViolation::SlotTaken(kind))
            }
            Some(kind) => kind,
            None => AddressKind::ALL
                .into_iter()
                .find(|k| self.address(*k).is_none())
                .ok_or(RuleViolation::AddressBookFull)?,
        };

        let address = Address {
            id: Uuid::new_v4(),
            kind,
            fields,
        };
        self.addresses.push(address.clone());
        Ok(address)
    }

    /// Overwrite the fields of the address in `kind`'s slot.
    pub fn edit_address(
        &mut self,
        kind: AddressKind,
        fields: AddressFields,
    ) -> Result<(), RuleViolation> {
        let address = self
            .addresses
            .iter_mut()
            .find(|a| a.kind == kind)
            .ok_or(RuleViolation::NoAddress(kind))?;
        address.fields = fields;
        Ok(())
    }

    /// Drop every cart entry for `product_id`. Returns how many went.
    pub fn remove_from_cart(&mut self, product_id: Uuid) -> usize {
        let before = self.cart.len();
        self.cart.retain(|item| item.product_id != product_id);
        before - self.cart.len()
    }

    pub fn cart_total(&self) -> Option<Price> {
        cart_total(&self.cart)
    }

    /// Turn the whole cart into a cash-on-delivery order and empty the cart.
    pub fn checkout(&mut self, now: DateTime<Utc>) -> Result<Order, RuleViolation> {
        if self.cart.is_empty() {
            return Err(RuleViolation::EmptyCart);
        }
        let total = self.cart_total().ok_or(RuleViolation::TotalOverflow)?;

        let order = Order {
            id: Uuid::new_v4(),
            ordered_at: now,
            cash_on_delivery: true,
            total,
            items: std::mem::take(&mut self.cart),
        };
        self.orders.push(order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: Price) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            image: None,
        }
    }

    fn user() -> User {
        User::new(
            NewUser {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "5550100".to_string(),
            },
            "hash".to_string(),
            Utc::now(),
        )
    }

    fn fields(city: &str) -> AddressFields {
        AddressFields {
            house: "12".to_string(),
            street: "Main St".to_string(),
            city: city.to_string(),
            pin_code: "10001".to_string(),
        }
    }

    #[test]
    fn test_new_user_starts_empty() {
        let u = user();
        assert!(u.cart.is_empty());
        assert!(u.addresses.is_empty());
        assert!(u.orders.is_empty());
        assert!(u.token.is_none());
    }

    #[test]
    fn test_cart_item_is_a_snapshot() {
        let mut p = product("Lamp", 40);
        let item = CartItem::from(&p);
        p.price = 99;
        assert_eq!(item.price, 40);
        assert_eq!(item.product_id, p.id);
    }

    #[test]
    fn test_cart_total_overflow() {
        let a = CartItem::from(&product("a", Price::MAX));
        let b = CartItem::from(&product("b", 1));
        assert_eq!(cart_total(&[a.clone()]), Some(Price::MAX));
        assert_eq!(cart_total(&[a, b]), None);
        assert_eq!(cart_total(&[]), Some(0));
    }

    #[test]
    fn test_checkout_moves_cart_into_order() {
        let mut u = user();
        u.cart.push(CartItem::from(&product("a", 10)));
        u.cart.push(CartItem::from(&product("b", 25)));

        let order = u.checkout(Utc::now()).unwrap();

        assert_eq!(order.total, 35);
        assert!(order.cash_on_delivery);
        assert_eq!(order.items.len(), 2);
        assert!(u.cart.is_empty());
        assert_eq!(u.orders, vec![order]);
    }

    #[test]
    fn test_checkout_rejects_empty_cart() {
        let mut u = user();
        assert_eq!(u.checkout(Utc::now()), Err(RuleViolation::EmptyCart));
        assert!(u.orders.is_empty());
    }

    #[test]
    fn test_checkout_overflow_leaves_cart_alone() {
        let mut u = user();
        u.cart.push(CartItem::from(&product("a", Price::MAX)));
        u.cart.push(CartItem::from(&product("b", 1)));
        assert_eq!(u.checkout(Utc::now()), Err(RuleViolation::TotalOverflow));
        assert_eq!(u.cart.len(), 2);
        assert!(u.orders.is_empty());
    }

    #[test]
    fn test_remove_from_cart_drops_every_copy() {
        let mut u = user();
        let lamp = product("Lamp", 40);
        let desk = product("Desk", 200);
        u.cart.push(CartItem::from(&lamp));
        u.cart.push(CartItem::from(&desk));
        u.cart.push(CartItem::from(&lamp));

        assert_eq!(u.remove_from_cart(lamp.id), 2);
        assert_eq!(u.cart.len(), 1);
        assert_eq!(u.cart[0].product_id, desk.id);
        assert_eq!(u.remove_from_cart(lamp.id), 0);
    }

    #[test]
    fn test_addresses_fill_home_then_work() {
        let mut u = user();
        let home = u.add_address(None, fields("Paris")).unwrap();
        let work = u.add_address(None, fields("Lyon")).unwrap();

        assert_eq!(home.kind, AddressKind::Home);
        assert_eq!(work.kind, AddressKind::Work);
        assert_eq!(
            u.add_address(None, fields("Nice")),
            Err(RuleViolation::AddressBookFull)
        );
        assert_eq!(u.addresses.len(), 2);
    }

    #[test]
    fn test_explicit_slot_must_be_free() {
        let mut u = user();
        u.add_address(Some(AddressKind::Work), fields("Lyon")).unwrap();
        assert_eq!(
            u.add_address(Some(AddressKind::Work), fields("Nice")),
            Err(RuleViolation::SlotTaken(AddressKind::Work))
        );
        // unspecified goes to the remaining slot
        let next = u.add_address(None, fields("Paris")).unwrap();
        assert_eq!(next.kind, AddressKind::Home);
    }

    #[test]
    fn test_edit_address_by_kind() {
        let mut u = user();
        u.add_address(None, fields("Paris")).unwrap();

        u.edit_address(AddressKind::Home, fields("Berlin")).unwrap();
        assert_eq!(u.address(AddressKind::Home).unwrap().fields.city, "Berlin");

        assert_eq!(
            u.edit_address(AddressKind::Work, fields("Rome")),
            Err(RuleViolation::NoAddress(AddressKind::Work))
        );
    }

    #[test]
    fn test_address_kind_serializes_lowercase() {
        let json = serde_json::to_string(&AddressKind::Home).unwrap();
        assert_eq!(json, "\"home\"");
        let address = Address {
            id: Uuid::nil(),
            kind: AddressKind::Work,
            fields: fields("Oslo"),
        };
        let value = serde_json::to_value(&address).unwrap();
        assert_eq!(value["kind"], "work");
        assert_eq!(value["city"], "Oslo");
    }
}
