//! Session-related types.
//!
//! The session is the single, explicit home for login state. Handlers go
//! through [`CurrentUser`] and the helpers in `crate::middleware` instead of
//! reading ambient storage keys.

use serde::{Deserialize, Serialize};

use marigold_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
/// Its presence is the sole gate for cart mutation and checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// The remote user id.
    pub id: UserId,
    /// Full display name.
    pub name: String,
    /// The email the user signed in with.
    pub email: Email,
}

impl CurrentUser {
    /// The user's given name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
