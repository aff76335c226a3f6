//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Credential checks delegated to the demo catalog service
//! - `cart` - Cart synchronizer (local mirror of the remote cart)

pub mod auth;
pub mod cart;
