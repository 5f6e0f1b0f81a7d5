//! Donor and recipient repositories.
//!
//! The two tables share a shape, so one generic repository serves both. The
//! [`ContactTable`] impls pin the table name and id type.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{PgConnection, PgPool};

use doacoes_core::{ContactDetails, DonorId, Email, RecipientId};

use super::RepositoryError;
use crate::models::Contact;

/// A table holding contacts.
pub trait ContactTable: Send + Sync + 'static {
    /// Id newtype of the table's rows.
    type Id: Copy
        + From<i32>
        + Into<i32>
        + std::fmt::Display
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
    /// Fully qualified table name.
    const TABLE: &'static str;
    /// Singular noun for messages.
    const NOUN: &'static str;
}

/// Marker for `doacoes.donor`.
pub enum DonorTable {}

/// Marker for `doacoes.recipient`.
pub enum RecipientTable {}

impl ContactTable for DonorTable {
    type Id = DonorId;
    const TABLE: &'static str = "doacoes.donor";
    const NOUN: &'static str = "donor";
}

impl ContactTable for RecipientTable {
    type Id = RecipientId;
    const TABLE: &'static str = "doacoes.recipient";
    const NOUN: &'static str = "recipient";
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: i32,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContactRow {
    fn into_contact<Id: From<i32>>(self) -> Result<Contact<Id>, RepositoryError> {
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;

        Ok(Contact {
            id: Id::from(self.id),
            name: self.name,
            email,
            phone: self.phone,
            address: self.address,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const CONTACT_COLUMNS: &str = "id, name, email, phone, address, notes, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for donors or recipients.
pub struct ContactRepository<'a, T: ContactTable> {
    pool: &'a PgPool,
    _table: PhantomData<T>,
}

/// Repository for donors.
pub type DonorRepository<'a> = ContactRepository<'a, DonorTable>;

/// Repository for recipients.
pub type RecipientRepository<'a> = ContactRepository<'a, RecipientTable>;

impl<'a, T: ContactTable> ContactRepository<'a, T> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            _table: PhantomData,
        }
    }

    /// List all rows by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Contact<T::Id>>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM {} ORDER BY name, id",
            T::TABLE
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ContactRow::into_contact).collect()
    }

    /// Get a row by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: T::Id) -> Result<Option<Contact<T::Id>>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut *conn, id).await
    }

    /// Insert a validated contact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, details: &ContactDetails) -> Result<Contact<T::Id>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut *conn, details).await
    }

    /// Replace every editable field of a contact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: T::Id,
        details: &ContactDetails,
    ) -> Result<Contact<T::Id>, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            r"
            UPDATE {}
            SET name = $2, email = $3, phone = $4, address = $5, notes = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {CONTACT_COLUMNS}
            ",
            T::TABLE
        ))
        .bind(Into::<i32>::into(id))
        .bind(&details.name)
        .bind(details.email.as_ref())
        .bind(details.phone.as_deref())
        .bind(details.address.as_deref())
        .bind(&details.notes)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)?;

        row.into_contact()
    }

    /// Delete a contact.
    ///
    /// Their donations go with them; a donor's items stay, with the donor
    /// reference cleared.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: T::Id) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", T::TABLE))
            .bind(Into::<i32>::into(id))
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Connection-level operations (usable inside a transaction)
    // =========================================================================

    /// Look a contact up on an existing connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn find(
        conn: &mut PgConnection,
        id: T::Id,
    ) -> Result<Option<Contact<T::Id>>, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM {} WHERE id = $1",
            T::TABLE
        ))
        .bind(Into::<i32>::into(id))
        .fetch_optional(&mut *conn)
        .await?;

        row.map(ContactRow::into_contact).transpose()
    }

    /// Insert a contact on an existing connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        conn: &mut PgConnection,
        details: &ContactDetails,
    ) -> Result<Contact<T::Id>, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            r"
            INSERT INTO {} (name, email, phone, address, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CONTACT_COLUMNS}
            ",
            T::TABLE
        ))
        .bind(&details.name)
        .bind(details.email.as_ref())
        .bind(details.phone.as_deref())
        .bind(details.address.as_deref())
        .bind(&details.notes)
        .fetch_one(&mut *conn)
        .await
        .map_err(RepositoryError::from_write)?;

        row.into_contact()
    }
}
