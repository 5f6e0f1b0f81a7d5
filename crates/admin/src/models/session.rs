//! Session-stored identity.

use serde::{Deserialize, Serialize};

use doacoes_core::{Capability, Email, Role, UserId};

use super::user::User;

/// The logged-in account.
///
/// Minimal data kept in the session (or resolved from a bearer token) to
/// identify and authorize the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: Role,
}

impl CurrentUser {
    /// Whether the caller's role grants `capability`.
    #[must_use]
    pub const fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Whether the user administers accounts (shows the Users menu).
    #[must_use]
    pub const fn manages_users(&self) -> bool {
        self.can(Capability::ManageUsers)
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
