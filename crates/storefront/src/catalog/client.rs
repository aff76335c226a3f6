//! Catalog REST client implementation.
//!
//! Uses `reqwest` for HTTP and caches product reads with `moka`
//! (5-minute TTL). Cart and user endpoints are always fetched live.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use marigold_core::{CartId, ProductId, UserId};

use crate::config::CatalogConfig;

use super::CatalogError;
use super::cache::CacheValue;
use super::types::{CartLineEntry, CartLinesPatch, CreatedUser, NewUser, Product, RemoteCart, User};

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the demo catalog service.
///
/// Provides typed access to products, carts, and user records.
/// Product reads are cached for 5 minutes.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    http: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                // No request timeout is configured; a hung catalog call
                // hangs the page that issued it.
                http: reqwest::Client::new(),
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Execute a GET request and parse the JSON response.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let response = self.inner.http.get(self.endpoint(path)).send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path,
                body = %body.chars().take(200).collect::<String>(),
                "catalog service returned non-success status"
            );
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(CatalogError::NotFound(path.to_owned()));
            }
            return Err(CatalogError::Status(status));
        }

        // The demo service answers 200 with a bare `null` body for unknown ids.
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(CatalogError::NotFound(path.to_owned()));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path,
                    body = %body.chars().take(500).collect::<String>(),
                    "failed to parse catalog response"
                );
                Err(CatalogError::Parse(e))
            }
        }
    }

    /// Fetch a collection endpoint and return the first entry matching the
    /// predicate, in response order.
    ///
    /// This is the single lookup-by-predicate helper behind cart resolution
    /// and the credential scan; `None` is the explicit not-found result.
    async fn find_first<T, F>(&self, path: &str, predicate: F) -> Result<Option<T>, CatalogError>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let items: Vec<T> = self.get_json(path).await?;
        Ok(items.into_iter().find(predicate))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the full product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        let cache_key = "products".to_owned();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let products: Vec<Product> = self.get_json("products").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a product by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get_json(&format!("products/{product_id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Resolve the cart belonging to a user.
    ///
    /// The service may hold several carts per user; the first one in response
    /// order wins. Returns `None` when the user has no cart, which callers
    /// treat as an empty cart rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn cart_for_user(&self, user_id: UserId) -> Result<Option<RemoteCart>, CatalogError> {
        self.find_first("carts", |cart: &RemoteCart| cart.user_id == user_id)
            .await
    }

    /// Replace a cart's line items with the given complete list.
    ///
    /// The write is a total replacement, never a delta. The response body is
    /// ignored; only the status code is checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or is rejected.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn replace_cart_lines(
        &self,
        cart_id: CartId,
        lines: &[CartLineEntry],
    ) -> Result<(), CatalogError> {
        let response = self
            .inner
            .http
            .patch(self.endpoint(&format!("carts/{cart_id}")))
            .json(&CartLinesPatch { products: lines })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, %cart_id, "cart replacement rejected");
            return Err(CatalogError::Status(status));
        }

        Ok(())
    }

    // =========================================================================
    // User Methods (not cached - credentials)
    // =========================================================================

    /// Scan the user records for an exact email + password match.
    ///
    /// The demo service offers no server-side verification; this linear scan
    /// over `GET /users` is the only credential check it supports.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn user_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, CatalogError> {
        self.find_first("users", |user: &User| {
            user.email == email && user.password == password
        })
        .await
    }

    /// Create a user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or is rejected.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create_user(&self, user: &NewUser) -> Result<UserId, CatalogError> {
        let response = self
            .inner
            .http
            .post(self.endpoint("users"))
            .json(user)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "user creation rejected"
            );
            return Err(CatalogError::Status(status));
        }

        let created: CreatedUser = serde_json::from_str(&body)?;
        Ok(created.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::types::UserName;
    use super::*;

    fn test_client(server: &MockServer) -> CatalogClient {
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

    #[tokio::test]
    async fn fetches_and_caches_product_listing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([product_json(1, 9.99), product_json(2, 5.50)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);

        let first = client.products().await.unwrap();
        assert_eq!(first.len(), 2);

        // Second call is served from the cache; the mock expects one hit.
        let second = client.products().await.unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn null_body_maps_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products/999"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.product(ProductId::new(999)).await;

        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn cart_resolution_takes_first_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/carts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "userId": 9, "products": []},
                {"id": 2, "userId": 4, "products": [{"productId": 1, "quantity": 1}]},
                {"id": 3, "userId": 4, "products": [{"productId": 2, "quantity": 2}]}
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server);

        let cart = client
            .cart_for_user(UserId::new(4))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cart.id, CartId::new(2));

        let missing = client.cart_for_user(UserId::new(42)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn replace_cart_lines_sends_full_list() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/carts/3"))
            .and(body_json(json!({
                "products": [
                    {"productId": 1, "quantity": 2},
                    {"productId": 5, "quantity": 1}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let lines = vec![
            CartLineEntry {
                product_id: ProductId::new(1),
                quantity: 2,
            },
            CartLineEntry {
                product_id: ProductId::new(5),
                quantity: 1,
            },
        ];

        client
            .replace_cart_lines(CartId::new(3), &lines)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn credential_scan_matches_exactly() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1,
                    "email": "ada@example.com",
                    "username": "ada",
                    "password": "lovelace1",
                    "name": {"firstname": "Ada", "lastname": "Lovelace"}
                }
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server);

        let hit = client
            .user_with_credentials("ada@example.com", "lovelace1")
            .await
            .unwrap();
        assert_eq!(hit.unwrap().id, UserId::new(1));

        let miss = client
            .user_with_credentials("ada@example.com", "wrong")
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn create_user_returns_assigned_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 11})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let new_user = NewUser {
            email: "grace@example.com".to_owned(),
            username: "gracehopper".to_owned(),
            password: "hopper123".to_owned(),
            name: UserName {
                firstname: "Grace".to_owned(),
                lastname: "Hopper".to_owned(),
            },
        };

        let id = client.create_user(&new_user).await.unwrap();
        assert_eq!(id, UserId::new(11));
    }
}
