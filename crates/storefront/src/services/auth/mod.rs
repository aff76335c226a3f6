//! Authentication service.
//!
//! Authentication is delegated entirely to the demo catalog service: a
//! credential check is a linear scan over its public user records, and
//! registration is a `POST /users` with a constructed payload. The service
//! is an external, untrusted stand-in backend - nothing here is a security
//! boundary, and no credential material is stored locally.

mod error;

pub use error::AuthError;

use tracing::instrument;

use marigold_core::{Email, UserId};

use crate::catalog::{CatalogClient, NewUser, UserName};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Accepted full name length range.
const MIN_FULL_NAME_LENGTH: usize = 3;
const MAX_FULL_NAME_LENGTH: usize = 50;

/// A successfully authenticated user, ready to become session state.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The remote user id.
    pub id: UserId,
    /// Full display name ("firstname lastname").
    pub display_name: String,
    /// The email the user signed in with.
    pub email: Email,
}

/// A validated registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Full name, later split into first and last name.
    pub full_name: String,
    /// Account email.
    pub email: Email,
    /// Account password.
    pub password: String,
}

impl Registration {
    /// Build the user creation payload the catalog service expects.
    ///
    /// The username is the full name with whitespace removed, lowercased;
    /// the first whitespace-separated word becomes the first name and the
    /// rest the last name.
    fn payload(&self) -> NewUser {
        let mut parts = self.full_name.split_whitespace();
        let firstname = parts.next().unwrap_or_default().to_owned();
        let lastname = parts.collect::<Vec<_>>().join(" ");

        let username = self
            .full_name
            .split_whitespace()
            .collect::<String>()
            .to_lowercase();

        NewUser {
            email: self.email.to_string(),
            username,
            password: self.password.clone(),
            name: UserName {
                firstname,
                lastname,
            },
        }
    }

    fn validate(&self) -> Result<(), AuthError> {
        let name_len = self.full_name.trim().chars().count();
        if !(MIN_FULL_NAME_LENGTH..=MAX_FULL_NAME_LENGTH).contains(&name_len) {
            return Err(AuthError::InvalidFullName {
                min: MIN_FULL_NAME_LENGTH,
                max: MAX_FULL_NAME_LENGTH,
            });
        }

        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        Ok(())
    }
}

/// Authentication service.
///
/// Handles credential checks and user registration against the catalog
/// service.
#[derive(Clone)]
pub struct AuthService {
    catalog: CatalogClient,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(catalog: CatalogClient) -> Self {
        Self { catalog }
    }

    /// Check credentials against the remote user records.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when no record matches, or a
    /// catalog error when the scan itself fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let user = self
            .catalog
            .user_with_credentials(email.as_str(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(AuthenticatedUser {
            id: user.id,
            display_name: format!("{} {}", user.name.firstname, user.name.lastname),
            // Keep the email the user submitted; the remote record's copy is
            // unvalidated external data.
            email: email.clone(),
        })
    }

    /// Register a new user with the catalog service.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unacceptable name or password, or a
    /// catalog error when the creation call fails.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<UserId, AuthError> {
        registration.validate()?;

        let id = self.catalog.create_user(&registration.payload()).await?;
        tracing::info!(user_id = %id, "user registered");

        Ok(id)
    }
}
