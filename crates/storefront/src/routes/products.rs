//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use tracing::instrument;

use marigold_core::ProductId;

use crate::catalog::{CatalogError, Product};
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Product display data for the listing grid.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i32,
    pub title: String,
    pub price: String,
    pub image: String,
}

/// Product display data for the detail page.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub image: String,
    pub rating: Option<RatingView>,
}

/// Rating display data.
#[derive(Clone, Copy)]
pub struct RatingView {
    pub rate: f64,
    pub count: i64,
}

/// Format a decimal amount as a price string.
fn format_price(amount: Decimal) -> String {
    format!("${amount:.2}")
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            title: product.title.clone(),
            price: format_price(product.price),
            image: product.image.clone(),
        }
    }
}

impl From<Product> for ProductDetailView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.as_i32(),
            title: product.title,
            description: product.description,
            category: product.category,
            price: format_price(product.price),
            image: product.image,
            rating: product.rating.map(|r| RatingView {
                rate: r.rate,
                count: r.count,
            }),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub notice: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
}

/// Display the product listing page.
///
/// A catalog failure renders an empty grid with a notice instead of an
/// error page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let (products, notice) = match state.catalog().products().await {
        Ok(products) => (
            products.iter().map(ProductCardView::from).collect(),
            None,
        ),
        Err(e) => {
            tracing::warn!("Failed to fetch product listing: {e}");
            (Vec::new(), Some("Failed to load products.".to_string()))
        }
    };

    ProductsIndexTemplate { products, notice }
}

/// Display the product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductShowTemplate, AppError> {
    let product = state
        .catalog()
        .product(ProductId::new(id))
        .await
        .map_err(|e| match e {
            CatalogError::NotFound(_) => AppError::NotFound(format!("product {id}")),
            other => AppError::Catalog(other),
        })?;

    Ok(ProductShowTemplate {
        product: ProductDetailView::from(product),
    })
}
