//! Checkout route handlers.
//!
//! Checkout requires a logged-in user. No payment data is collected; placing
//! an order validates the shipping form and renders a confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::routes::cart::CartView;
use crate::services::cart::CartSynchronizer;
use crate::state::AppState;

// =============================================================================
// Shipping Options
// =============================================================================

/// A shipping country and its selectable cities.
pub struct CountryOptions {
    pub name: &'static str,
    pub cities: &'static [&'static str],
}

/// Shipping destinations offered at checkout.
pub const COUNTRIES: &[CountryOptions] = &[
    CountryOptions {
        name: "Saudi Arabia",
        cities: &["Riyadh", "Jeddah", "Mecca", "Dammam", "Medina"],
    },
    CountryOptions {
        name: "United States",
        cities: &["New York", "Los Angeles", "Chicago", "Houston", "Miami"],
    },
    CountryOptions {
        name: "United Kingdom",
        cities: &["London", "Manchester", "Birmingham", "Liverpool", "Leeds"],
    },
    CountryOptions {
        name: "Canada",
        cities: &["Toronto", "Vancouver", "Montreal", "Calgary", "Ottawa"],
    },
    CountryOptions {
        name: "Australia",
        cities: &["Sydney", "Melbourne", "Brisbane", "Perth", "Adelaide"],
    },
    CountryOptions {
        name: "India",
        cities: &["Mumbai", "Delhi", "Bengaluru", "Chennai", "Kolkata"],
    },
    CountryOptions {
        name: "Germany",
        cities: &["Berlin", "Munich", "Frankfurt", "Hamburg", "Cologne"],
    },
    CountryOptions {
        name: "France",
        cities: &["Paris", "Lyon", "Marseille", "Toulouse", "Nice"],
    },
    CountryOptions {
        name: "United Arab Emirates",
        cities: &["Dubai", "Abu Dhabi", "Sharjah", "Ajman", "Al Ain"],
    },
    CountryOptions {
        name: "Egypt",
        cities: &["Cairo", "Alexandria", "Giza", "Luxor", "Aswan"],
    },
];

// =============================================================================
// Form and Templates
// =============================================================================

/// Shipping form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub address: String,
    pub city: String,
    pub country: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub countries: &'static [CountryOptions],
    pub first_name: String,
    pub error: Option<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmed.html")]
pub struct OrderConfirmedTemplate {
    pub first_name: String,
    pub total: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn load_cart_view(state: &AppState, user: &CurrentUser) -> Option<CartView> {
    match CartSynchronizer::load(state.catalog().clone(), Some(user.id)).await {
        Ok(sync) if !sync.is_empty() => Some(CartView::from(&sync)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Failed to load cart for checkout: {e}");
            None
        }
    }
}

/// Display the checkout page.
///
/// An empty or unloadable cart redirects back to the cart page.
#[instrument(skip(state, user))]
pub async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Response {
    let Some(cart) = load_cart_view(&state, &user).await else {
        return Redirect::to("/cart").into_response();
    };

    CheckoutTemplate {
        cart,
        countries: COUNTRIES,
        first_name: user.first_name().to_string(),
        error: None,
    }
    .into_response()
}

/// Handle the shipping form and confirm the order.
#[instrument(skip(state, user, form))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let Some(cart) = load_cart_view(&state, &user).await else {
        return Redirect::to("/cart").into_response();
    };

    if form.address.trim().is_empty()
        || form.city.trim().is_empty()
        || form.country.trim().is_empty()
    {
        return CheckoutTemplate {
            cart,
            countries: COUNTRIES,
            first_name: user.first_name().to_string(),
            error: Some("Please fill in your address, city, and country.".to_string()),
        }
        .into_response();
    }

    tracing::info!(user_id = %user.id, country = %form.country, "order placed");

    OrderConfirmedTemplate {
        first_name: user.first_name().to_string(),
        total: cart.total,
    }
    .into_response()
}
