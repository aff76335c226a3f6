//! Domain types for the demo catalog service.
//!
//! These mirror the JSON shapes the service returns. Field names that the
//! wire spells in camelCase (`userId`, `productId`) are renamed accordingly.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use marigold_core::{CartId, ProductId, UserId};

// =============================================================================
// Products
// =============================================================================

/// A catalog product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price in USD. The wire carries a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Category slug (e.g. "electronics").
    #[serde(default)]
    pub category: String,
    /// Product image URL.
    #[serde(default)]
    pub image: String,
    /// Aggregate review rating, when the service includes one.
    #[serde(default)]
    pub rating: Option<Rating>,
}

/// Aggregate product rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    /// Average rating value (e.g., 4.5).
    pub rate: f64,
    /// Total number of reviews.
    pub count: i64,
}

// =============================================================================
// Carts
// =============================================================================

/// A cart record as owned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    /// Cart ID.
    pub id: CartId,
    /// Owning user.
    pub user_id: UserId,
    /// Ordered line items. An absent or malformed list reads as empty.
    #[serde(default, deserialize_with = "lenient_lines")]
    pub products: Vec<CartLineEntry>,
}

/// One `(productId, quantity)` pair inside a remote cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineEntry {
    /// Referenced product.
    pub product_id: ProductId,
    /// Units of that product.
    pub quantity: u32,
}

/// Body for a full line-item replacement (`PATCH /carts/{id}`).
#[derive(Debug, Serialize)]
pub struct CartLinesPatch<'a> {
    /// The complete replacement list, never a delta.
    pub products: &'a [CartLineEntry],
}

/// Deserialize a cart line list, treating a malformed value as empty.
///
/// The demo service has no schema guarantees; a cart whose `products` field
/// is not a well-formed entry array must read as an empty cart, not a failed
/// response.
fn lenient_lines<'de, D>(deserializer: D) -> Result<Vec<CartLineEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

// =============================================================================
// Users
// =============================================================================

/// A user record as returned by `GET /users`.
///
/// The demo service exposes passwords in plaintext; this is a property of the
/// external service, which is treated as an untrusted stand-in backend and
/// never as a security boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Account email.
    pub email: String,
    /// Account username.
    pub username: String,
    /// Plaintext password, as the demo service stores it.
    pub password: String,
    /// Split display name.
    pub name: UserName,
}

/// First/last name pair used by the user records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserName {
    /// Given name.
    pub firstname: String,
    /// Family name.
    pub lastname: String,
}

/// Registration payload for `POST /users`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    /// Account email.
    pub email: String,
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Split display name.
    pub name: UserName,
}

/// Response body of `POST /users`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CreatedUser {
    /// ID assigned by the service.
    pub id: UserId,
}
