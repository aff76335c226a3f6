//! Cart synchronizer.
//!
//! Maintains a locally-rendered mirror of one user's remote cart and
//! translates UI-level mutations into full-state replacement calls against
//! the remote cart resource.
//!
//! The remote service owns the cart; this type never creates one. It only
//! discovers the cart matching the current user, joins product details onto
//! its line items, and pushes the complete line list back after each local
//! mutation. Mutations are optimistic: the local list changes first, and a
//! failed push leaves it in place with every line flagged as unsynced so the
//! UI can signal drift. There are no retries and no rollback; the next
//! [`CartSynchronizer::load`] reconciles.

use futures::future;
use rust_decimal::Decimal;
use tracing::instrument;

use marigold_core::{ProductId, UserId};

use crate::catalog::{CartLineEntry, CatalogClient, CatalogError, Product};

// =============================================================================
// Line Items
// =============================================================================

/// One line of the local cart: a remote cart entry joined with its product
/// record.
///
/// Exists only in memory for the lifetime of the page that loaded it.
#[derive(Debug, Clone)]
pub struct LineItem {
    /// Referenced product.
    pub product_id: ProductId,
    /// Product title.
    pub title: String,
    /// Unit price.
    pub price: Decimal,
    /// Product image URL.
    pub image: String,
    /// Units in the cart. Always >= 1 after a mutation.
    pub quantity: u32,
    /// Whether the remote cart is known to reflect this line.
    pub synced: bool,
}

impl LineItem {
    fn new(product: Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            quantity,
            synced: true,
        }
    }

    /// Line subtotal: unit price times quantity, unrounded.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    const fn entry(&self) -> CartLineEntry {
        CartLineEntry {
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }
}

// =============================================================================
// Mutation Outcomes
// =============================================================================

/// Result of an optimistic cart mutation.
#[derive(Debug)]
pub enum MutationOutcome {
    /// The request did not change the local cart; no remote call was made.
    Noop,
    /// Local change applied and the full line list was accepted remotely.
    Committed,
    /// Local change applied; the user has no remote cart to push to.
    LocalOnly,
    /// Local change applied; the remote replacement failed and the local
    /// lines are flagged as unsynced.
    Drifted(CatalogError),
}

// =============================================================================
// CartSynchronizer
// =============================================================================

/// Locally-rendered, eventually-consistent mirror of one user's remote cart.
pub struct CartSynchronizer {
    catalog: CatalogClient,
    user_id: Option<UserId>,
    lines: Vec<LineItem>,
}

impl CartSynchronizer {
    /// Load the cart for a user.
    ///
    /// A missing user id reads as "not logged in" and yields an empty cart
    /// without any remote calls. A user with no cart record, or a cart whose
    /// line list is absent or malformed, also yields an empty cart with no
    /// product fetches. Otherwise one product fetch per line item runs
    /// concurrently and the load fails as a whole if any single fetch fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart listing or any product fetch fails.
    #[instrument(skip(catalog))]
    pub async fn load(
        catalog: CatalogClient,
        user_id: Option<UserId>,
    ) -> Result<Self, CatalogError> {
        let Some(user_id) = user_id else {
            return Ok(Self::empty(catalog, None));
        };

        let Some(cart) = catalog.cart_for_user(user_id).await? else {
            return Ok(Self::empty(catalog, Some(user_id)));
        };

        let fetches = cart.products.iter().map(|entry| {
            let catalog = catalog.clone();
            let entry = *entry;
            async move {
                let product = catalog.product(entry.product_id).await?;
                Ok::<_, CatalogError>(LineItem::new(product, entry.quantity))
            }
        });

        // All-or-nothing join: a single failing fetch fails the entire load.
        let lines = future::try_join_all(fetches).await?;

        Ok(Self {
            catalog,
            user_id: Some(user_id),
            lines,
        })
    }

    const fn empty(catalog: CatalogClient, user_id: Option<UserId>) -> Self {
        Self {
            catalog,
            user_id,
            lines: Vec::new(),
        }
    }

    /// The current local line items.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Whether the local cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any local line is not known to be reflected remotely.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        self.lines.iter().any(|line| !line.synced)
    }

    /// Cart total: the sum of line subtotals. Zero for an empty cart.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(LineItem::subtotal).sum()
    }

    /// Set the quantity of a line item.
    ///
    /// A quantity below 1, or a product id that is not in the cart, is
    /// rejected before any state changes. Otherwise the local line updates
    /// first and the full line list is pushed to the remote cart.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> MutationOutcome {
        if quantity < 1 {
            return MutationOutcome::Noop;
        }

        let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        else {
            return MutationOutcome::Noop;
        };

        line.quantity = quantity;
        self.push_lines().await
    }

    /// Remove a line item.
    ///
    /// Removing a product id that is not in the cart is a local no-op.
    /// Otherwise the line is filtered out first and the remaining full line
    /// list is pushed to the remote cart.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&mut self, product_id: ProductId) -> MutationOutcome {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);

        if self.lines.len() == before {
            return MutationOutcome::Noop;
        }

        self.push_lines().await
    }

    /// Push the full local line list to the remote cart.
    ///
    /// Re-resolves the remote cart id on every call; the resolved id is
    /// deliberately not cached across mutations. One remote read plus one
    /// remote write per mutation.
    async fn push_lines(&mut self) -> MutationOutcome {
        let Some(user_id) = self.user_id else {
            return MutationOutcome::LocalOnly;
        };

        let cart = match self.catalog.cart_for_user(user_id).await {
            Ok(Some(cart)) => cart,
            Ok(None) => return MutationOutcome::LocalOnly,
            Err(e) => {
                self.mark_all(false);
                return MutationOutcome::Drifted(e);
            }
        };

        let entries: Vec<CartLineEntry> = self.lines.iter().map(LineItem::entry).collect();

        match self.catalog.replace_cart_lines(cart.id, &entries).await {
            Ok(()) => {
                self.mark_all(true);
                MutationOutcome::Committed
            }
            Err(e) => {
                tracing::warn!(error = %e, "cart replacement failed; local state kept");
                self.mark_all(false);
                MutationOutcome::Drifted(e)
            }
        }
    }

    fn mark_all(&mut self, synced: bool) {
        for line in &mut self.lines {
            line.synced = synced;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::CatalogConfig;

    use super::*;

    fn test_catalog(server: &MockServer) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
        })
    }

    fn product_json(id: i32, price: f64) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Product {id}"),
            "price": price,
            "description": "",
            "category": "misc",
            "image": format!("https://img.example/{id}.jpg"),
            "rating": {"rate": 4.0, "count": 10}
        })
    }

    async fn mount_carts(server: &MockServer, carts: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/carts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(carts))
            .mount(server)
            .await;
    }

    async fn mount_product(server: &MockServer, id: i32, price: f64) {
        Mock::given(method("GET"))
            .and(path(format!("/products/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json(id, price)))
            .mount(server)
            .await;
    }

    async fn mount_patch_ok(server: &MockServer, cart_id: i32) {
        Mock::given(method("PATCH"))
            .and(path(format!("/carts/{cart_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": cart_id})))
            .mount(server)
            .await;
    }

    /// The two-line cart used by most tests: user 2 owns cart 3 with
    /// product 1 (qty 2) and product 2 (qty 1).
    async fn two_line_fixture(server: &MockServer) {
        mount_carts(
            server,
            json!([{"id": 3, "userId": 2, "products": [
                {"productId": 1, "quantity": 2},
                {"productId": 2, "quantity": 1}
            ]}]),
        )
        .await;
        mount_product(server, 1, 10.00).await;
        mount_product(server, 2, 5.50).await;
    }

    fn quantities(sync: &CartSynchronizer) -> Vec<(i32, u32)> {
        sync.lines()
            .iter()
            .map(|line| (line.product_id.as_i32(), line.quantity))
            .collect()
    }

    /// The full line lists carried by PATCH requests, in call order.
    async fn patched_bodies(server: &MockServer) -> Vec<serde_json::Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|req| req.method.as_str() == "PATCH")
            .map(|req| serde_json::from_slice(&req.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn load_joins_products_onto_cart_lines() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;

        let sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        assert_eq!(quantities(&sync), vec![(1, 2), (2, 1)]);
        let first = &sync.lines()[0];
        assert_eq!(first.title, "Product 1");
        assert_eq!(first.price, Decimal::new(1000, 2));
        assert!(first.synced);
    }

    #[tokio::test]
    async fn load_without_user_is_empty_and_makes_no_calls() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let sync = CartSynchronizer::load(test_catalog(&server), None)
            .await
            .unwrap();

        assert!(sync.is_empty());
    }

    #[tokio::test]
    async fn load_without_matching_cart_fetches_no_products() {
        let server = MockServer::start().await;
        mount_carts(
            &server,
            json!([{"id": 1, "userId": 7, "products": [{"productId": 1, "quantity": 1}]}]),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/products/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json(1, 1.0)))
            .expect(0)
            .mount(&server)
            .await;

        let sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(42)))
            .await
            .unwrap();

        assert!(sync.is_empty());
    }

    #[tokio::test]
    async fn load_with_malformed_line_list_is_empty() {
        let server = MockServer::start().await;
        mount_carts(&server, json!([{"id": 3, "userId": 2, "products": 17}])).await;

        let sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        assert!(sync.is_empty());
    }

    #[tokio::test]
    async fn load_fails_as_a_whole_when_one_product_fetch_fails() {
        let server = MockServer::start().await;
        mount_carts(
            &server,
            json!([{"id": 3, "userId": 2, "products": [
                {"productId": 1, "quantity": 1},
                {"productId": 2, "quantity": 1},
                {"productId": 3, "quantity": 1},
                {"productId": 4, "quantity": 1},
                {"productId": 5, "quantity": 1}
            ]}]),
        )
        .await;
        for id in [1, 2, 4, 5] {
            mount_product(&server, id, 1.0).await;
        }
        Mock::given(method("GET"))
            .and(path("/products/3"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2))).await;

        assert!(matches!(result, Err(CatalogError::Status(_))));
    }

    #[tokio::test]
    async fn set_quantity_updates_one_line_and_leaves_others() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;
        mount_patch_ok(&server, 3).await;

        let mut sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        let outcome = sync.set_quantity(ProductId::new(1), 5).await;

        assert!(matches!(outcome, MutationOutcome::Committed));
        assert_eq!(quantities(&sync), vec![(1, 5), (2, 1)]);
        assert!(!sync.has_drift());
    }

    #[tokio::test]
    async fn set_quantity_below_one_is_a_noop_with_no_remote_calls() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();
        let calls_after_load = server.received_requests().await.unwrap().len();

        let outcome = sync.set_quantity(ProductId::new(1), 0).await;

        assert!(matches!(outcome, MutationOutcome::Noop));
        assert_eq!(quantities(&sync), vec![(1, 2), (2, 1)]);
        assert_eq!(
            server.received_requests().await.unwrap().len(),
            calls_after_load
        );
    }

    #[tokio::test]
    async fn remove_item_removes_exactly_one_line() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;
        mount_patch_ok(&server, 3).await;

        let mut sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        let outcome = sync.remove_item(ProductId::new(2)).await;
        assert!(matches!(outcome, MutationOutcome::Committed));
        assert_eq!(quantities(&sync), vec![(1, 2)]);

        let bodies = patched_bodies(&server).await;
        assert_eq!(
            bodies,
            vec![json!({"products": [{"productId": 1, "quantity": 2}]})]
        );
    }

    #[tokio::test]
    async fn removing_unknown_id_is_a_local_noop() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        let outcome = sync.remove_item(ProductId::new(99)).await;

        assert!(matches!(outcome, MutationOutcome::Noop));
        assert_eq!(quantities(&sync), vec![(1, 2), (2, 1)]);
    }

    #[tokio::test]
    async fn total_sums_price_times_quantity() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;

        let sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        // 10.00 * 2 + 5.50 * 1
        assert_eq!(sync.total(), Decimal::new(2550, 2));
    }

    #[tokio::test]
    async fn total_of_empty_cart_is_zero() {
        let server = MockServer::start().await;
        mount_carts(&server, json!([])).await;

        let sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        assert_eq!(sync.total(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn sequential_mutations_push_full_lists_in_call_order() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;
        mount_patch_ok(&server, 3).await;

        let mut sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        sync.set_quantity(ProductId::new(1), 2).await;
        sync.set_quantity(ProductId::new(1), 5).await;

        assert_eq!(quantities(&sync), vec![(1, 5), (2, 1)]);

        let bodies = patched_bodies(&server).await;
        assert_eq!(
            bodies,
            vec![
                json!({"products": [
                    {"productId": 1, "quantity": 2},
                    {"productId": 2, "quantity": 1}
                ]}),
                json!({"products": [
                    {"productId": 1, "quantity": 5},
                    {"productId": 2, "quantity": 1}
                ]}),
            ]
        );
    }

    #[tokio::test]
    async fn failed_push_keeps_optimistic_state_and_flags_drift() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;

        Mock::given(method("PATCH"))
            .and(path("/carts/3"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        let outcome = sync.set_quantity(ProductId::new(1), 9).await;

        assert!(matches!(outcome, MutationOutcome::Drifted(_)));
        // No rollback: the optimistic update stays.
        assert_eq!(quantities(&sync), vec![(1, 9), (2, 1)]);
        assert!(sync.has_drift());
    }

    #[tokio::test]
    async fn mutation_reresolves_cart_id_on_every_call() {
        let server = MockServer::start().await;
        two_line_fixture(&server).await;
        mount_patch_ok(&server, 3).await;

        let mut sync = CartSynchronizer::load(test_catalog(&server), Some(UserId::new(2)))
            .await
            .unwrap();

        sync.set_quantity(ProductId::new(1), 3).await;
        sync.remove_item(ProductId::new(2)).await;

        // One GET /carts for the load plus one per mutation.
        let cart_reads = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|req| req.method.as_str() == "GET" && req.url.path() == "/carts")
            .count();
        assert_eq!(cart_reads, 3);
    }
}
