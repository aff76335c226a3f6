//! Demo catalog service client.
//!
//! # Architecture
//!
//! - Plain JSON-over-HTTPS REST client built on `reqwest`
//! - The catalog service is source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for product reads (5 minute TTL)
//! - Carts and users are never cached (mutable state / credentials)
//!
//! # Example
//!
//! ```rust,ignore
//! use marigold_storefront::catalog::CatalogClient;
//!
//! let catalog = CatalogClient::new(&config.catalog);
//!
//! // Get a product
//! let product = catalog.product(ProductId::new(1)).await?;
//!
//! // Resolve a user's cart and replace its line items
//! let cart = catalog.cart_for_user(UserId::new(2)).await?;
//! if let Some(cart) = cart {
//!     catalog.replace_cart_lines(cart.id, &cart.products).await?;
//! }
//! ```

mod cache;
mod client;
pub mod types;

pub use client::CatalogClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status code.
    #[error("catalog service returned status {0}")]
    Status(reqwest::StatusCode),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl CatalogError {
    /// Whether this error represents a missing resource rather than a
    /// transport or service failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
