//! Authentication route handlers.
//!
//! Handles login, registration, and logout. Credentials are checked against
//! the demo catalog service's public user records; session state is the only
//! thing this application stores.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marigold_core::Email;

use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

/// Account menu fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/account_menu.html")]
pub struct AccountMenuTemplate {
    pub user: Option<MenuUser>,
}

/// Minimal user data for the account menu.
pub struct MenuUser {
    pub first_name: String,
}

// =============================================================================
// Message Mapping
// =============================================================================

fn login_error_message(code: &str) -> String {
    match code {
        "credentials" => "No account found with that email and password.",
        "invalid_email" => "Please enter a valid email address.",
        "missing_fields" => "Email and password are required.",
        "session" => "Your session could not be saved. Please try again.",
        _ => "Login failed. Please try again later.",
    }
    .to_string()
}

fn login_success_message(code: &str) -> String {
    match code {
        "registered" => "Sign-up successful! You can now log in.",
        _ => "Success.",
    }
    .to_string()
}

fn register_error_message(code: &str) -> String {
    match code {
        "password_mismatch" => "Passwords must match.",
        "password_too_short" => "Password must be at least 8 characters.",
        "name_length" => "Full name must be between 3 and 50 characters.",
        "invalid_email" => "Please enter a valid email address.",
        _ => "Registration failed. Please try again.",
    }
    .to_string()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(login_error_message),
        success: query.success.as_deref().map(login_success_message),
    }
}

/// Handle login form submission.
///
/// Checks credentials against the catalog service's user records and stores
/// the matched identity in the session.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Redirect::to("/auth/login?error=missing_fields").into_response();
    }

    let Ok(email) = Email::parse(form.email.trim()) else {
        return Redirect::to("/auth/login?error=invalid_email").into_response();
    };

    match state.auth().authenticate(&email, &form.password).await {
        Ok(user) => {
            let current_user = CurrentUser {
                id: user.id,
                name: user.display_name,
                email: user.email,
            };

            if let Err(e) = set_current_user(&session, &current_user).await {
                tracing::error!("Failed to set session: {e}");
                return Redirect::to("/auth/login?error=session").into_response();
            }

            Redirect::to("/").into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            Redirect::to("/auth/login?error=credentials").into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            Redirect::to("/auth/login?error=unavailable").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        error: query.error.as_deref().map(register_error_message),
    }
}

/// Handle registration form submission.
///
/// Builds the catalog service's user creation payload and posts it.
#[instrument(skip(state, form))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/auth/register?error=password_mismatch").into_response();
    }

    let Ok(email) = Email::parse(form.email.trim()) else {
        return Redirect::to("/auth/register?error=invalid_email").into_response();
    };

    let registration = Registration {
        full_name: form.full_name.trim().to_string(),
        email,
        password: form.password,
    };

    match state.auth().register(&registration).await {
        Ok(_) => Redirect::to("/auth/login?success=registered").into_response(),
        Err(AuthError::InvalidFullName { .. }) => {
            Redirect::to("/auth/register?error=name_length").into_response()
        }
        Err(AuthError::WeakPassword(_)) => {
            Redirect::to("/auth/register?error=password_too_short").into_response()
        }
        Err(AuthError::InvalidEmail(_)) => {
            Redirect::to("/auth/register?error=invalid_email").into_response()
        }
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            Redirect::to("/auth/register?error=failed").into_response()
        }
    }
}

// =============================================================================
// Logout and Menu Routes
// =============================================================================

/// Handle logout.
///
/// Clears the user context and destroys the entire session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }

    Redirect::to("/").into_response()
}

/// Account menu fragment (for HTMX).
pub async fn menu(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    AccountMenuTemplate {
        user: user.map(|u| MenuUser {
            first_name: u.first_name().to_string(),
        }),
    }
}
