//! Authentication error types.

use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marigold_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Full name outside the accepted length range.
    #[error("full name must be between {min} and {max} characters")]
    InvalidFullName {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Catalog service error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
