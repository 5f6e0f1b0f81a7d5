//! Database operations.
//!
//! # Schema: `doacoes`
//!
//! ## Tables
//!
//! - `app_user` - Staff accounts (ADMIN / GERENTE)
//! - `donor`, `recipient` - Contacts; at least one of email or phone
//! - `item` - Donated goods; donor reference nulled when the donor is deleted
//! - `donation` - Exactly one of item or amount; cascades from donor, recipient and item
//! - `api_token` - Bearer token digests for the JSON API
//! - `session` - tower-sessions store
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p doacoes-cli -- migrate
//! ```

pub mod contacts;
pub mod donations;
pub mod items;
pub mod tokens;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use contacts::{
    ContactRepository, ContactTable, DonorRepository, DonorTable, RecipientRepository,
    RecipientTable,
};
pub use donations::{DonationFilter, DonationRepository};
pub use items::ItemRepository;
pub use tokens::TokenRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key pointed at a row that does not exist.
    #[error("{0} does not exist")]
    InvalidReference(&'static str),
}

impl RepositoryError {
    /// Translate unique and foreign-key violations; pass everything else through.
    pub(crate) fn from_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return Self::Conflict("email already exists".to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference(reference_field(
                    db_err.constraint().unwrap_or_default(),
                ));
            }
        }
        Self::Database(e)
    }
}

/// Field named by a foreign-key constraint such as `item_donor_id_fkey`.
///
/// Postgres names these `<table>_<column>_fkey`, so the column is matched
/// rather than the table.
fn reference_field(constraint: &str) -> &'static str {
    const COLUMNS: [(&str, &str); 4] = [
        ("_donor_id_", "donor"),
        ("_recipient_id_", "recipient"),
        ("_item_id_", "item"),
        ("_user_id_", "user"),
    ];
    COLUMNS
        .iter()
        .find(|(column, _)| constraint.contains(column))
        .map_or("donor", |&(_, field)| field)
}

/// Row counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct Counts {
    pub donors: i64,
    pub recipients: i64,
    pub items: i64,
    pub donations: i64,
}

/// Count every record kind in one round trip.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn counts(pool: &PgPool) -> Result<Counts, RepositoryError> {
    let counts = sqlx::query_as::<_, Counts>(
        r"
        SELECT
            (SELECT COUNT(*) FROM doacoes.donor) AS donors,
            (SELECT COUNT(*) FROM doacoes.recipient) AS recipients,
            (SELECT COUNT(*) FROM doacoes.item) AS items,
            (SELECT COUNT(*) FROM doacoes.donation) AS donations
        ",
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_field_follows_column() {
        assert_eq!(reference_field("item_donor_id_fkey"), "donor");
        assert_eq!(reference_field("donation_donor_id_fkey"), "donor");
        assert_eq!(reference_field("donation_recipient_id_fkey"), "recipient");
        assert_eq!(reference_field("donation_item_id_fkey"), "item");
        assert_eq!(reference_field("api_token_user_id_fkey"), "user");
    }
}
