//! Cache value wrapper for catalog responses.

use super::types::Product;

/// Values stored in the catalog response cache.
///
/// Only immutable catalog reads are cached; carts and users never appear
/// here.
#[derive(Clone)]
pub enum CacheValue {
    /// A single product keyed by id.
    Product(Box<Product>),
    /// The full product listing.
    Products(Vec<Product>),
}
