//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the remote catalog service; each request
//! rebuilds the local mirror through `CartSynchronizer`, applies the
//! mutation optimistically, and renders the local state whatever the remote
//! push outcome was.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use marigold_core::{ProductId, UserId};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::cart::{CartSynchronizer, LineItem, MutationOutcome};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: String,
    pub synced: bool,
}

/// A user-facing notice rendered above the cart.
#[derive(Clone)]
pub struct Notice {
    pub level: &'static str,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: "success",
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: "info",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: "error",
            message: message.into(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
    pub notice: Option<Notice>,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: "$0.00".to_string(),
            item_count: 0,
            notice: None,
        }
    }

    /// Attach an optional notice.
    #[must_use]
    pub fn with_notice(mut self, notice: Option<Notice>) -> Self {
        self.notice = notice;
        self
    }
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Format a decimal amount as a price string.
fn format_price(amount: Decimal) -> String {
    format!("${amount:.2}")
}

impl From<&CartSynchronizer> for CartView {
    fn from(sync: &CartSynchronizer) -> Self {
        Self {
            items: sync.lines().iter().map(CartItemView::from).collect(),
            total: format_price(sync.total()),
            item_count: sync.lines().iter().map(|line| line.quantity).sum(),
            notice: None,
        }
    }
}

impl From<&LineItem> for CartItemView {
    fn from(line: &LineItem) -> Self {
        Self {
            product_id: line.product_id.as_i32(),
            title: line.title.clone(),
            quantity: line.quantity,
            price: format_price(line.price),
            line_price: format_price(line.subtotal()),
            image: line.image.clone(),
            synced: line.synced,
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

async fn load_synchronizer(
    state: &AppState,
    user_id: Option<UserId>,
) -> Result<CartSynchronizer, CartView> {
    CartSynchronizer::load(state.catalog().clone(), user_id)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to load cart: {e}");
            CartView::empty().with_notice(Some(Notice::error("Failed to load your cart.")))
        })
}

/// Display cart page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let cart = match load_synchronizer(&state, user.map(|u| u.id)).await {
        Ok(sync) => CartView::from(&sync),
        Err(fallback) => fallback,
    };

    CartShowTemplate { cart }
}

/// Update cart item quantity (HTMX).
///
/// The local line updates first; a failed remote replacement keeps the
/// optimistic state and surfaces an error notice plus a drift marker.
#[instrument(skip(state, user))]
pub async fn update(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let mut sync = match load_synchronizer(&state, user.map(|u| u.id)).await {
        Ok(sync) => sync,
        Err(fallback) => return CartItemsTemplate { cart: fallback }.into_response(),
    };

    let quantity = u32::try_from(form.quantity).unwrap_or(0);
    let outcome = sync
        .set_quantity(ProductId::new(form.product_id), quantity)
        .await;

    let notice = match outcome {
        MutationOutcome::Noop => None,
        MutationOutcome::Committed | MutationOutcome::LocalOnly => {
            Some(Notice::success("Cart updated."))
        }
        MutationOutcome::Drifted(e) => {
            tracing::error!("Failed to update quantity on server: {e}");
            Some(Notice::error("Failed to update quantity on server."))
        }
    };

    let cart = CartView::from(&sync).with_notice(notice);
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let mut sync = match load_synchronizer(&state, user.map(|u| u.id)).await {
        Ok(sync) => sync,
        Err(fallback) => return CartItemsTemplate { cart: fallback }.into_response(),
    };

    let outcome = sync.remove_item(ProductId::new(form.product_id)).await;

    let notice = match outcome {
        MutationOutcome::Noop => None,
        MutationOutcome::Committed | MutationOutcome::LocalOnly => {
            Some(Notice::info("Item removed from cart."))
        }
        MutationOutcome::Drifted(e) => {
            tracing::error!("Failed to remove item on server: {e}");
            Some(Notice::error("Failed to remove item on server."))
        }
    };

    let cart = CartView::from(&sync).with_notice(notice);
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, user))]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let count = match CartSynchronizer::load(state.catalog().clone(), user.map(|u| u.id)).await {
        Ok(sync) => sync.lines().iter().map(|line| line.quantity).sum(),
        Err(e) => {
            tracing::warn!("Failed to load cart for count badge: {e}");
            0
        }
    };

    CartCountTemplate { count }
}
