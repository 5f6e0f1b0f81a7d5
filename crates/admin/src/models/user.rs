//! Staff account domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use doacoes_core::{Email, Role, UserId};

/// A staff account.
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Last successful login or token issuance.
    pub last_access: Option<DateTime<Utc>>,
}
