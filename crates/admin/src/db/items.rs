//! Item repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use doacoes_core::{DonorId, ItemCategory, ItemDetails, ItemId};

use super::RepositoryError;
use crate::models::Item;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i32,
    name: String,
    category: String,
    description: String,
    photo: Option<String>,
    available: bool,
    donor_id: Option<i32>,
    donor_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let category = ItemCategory::parse(&row.category).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
        })?;

        Ok(Self {
            id: ItemId::new(row.id),
            name: row.name,
            category,
            category_label: category.label(),
            description: row.description,
            photo: row.photo,
            available: row.available,
            donor: row.donor_id.map(DonorId::new),
            donor_name: row.donor_name,
            created_at: row.created_at,
        })
    }
}

const SELECT_ITEMS: &str = r"
    SELECT i.id, i.name, i.category, i.description, i.photo, i.available,
           i.donor_id, d.name AS donor_name, i.created_at
    FROM doacoes.item i
    LEFT JOIN doacoes.donor d ON d.id = i.donor_id
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for donated items.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all items by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEMS} ORDER BY i.name, i.id"))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List items still waiting for a recipient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_available(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "{SELECT_ITEMS} WHERE i.available ORDER BY i.name, i.id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an item by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEMS} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a validated item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the donor does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        details: &ItemDetails,
        photo: Option<&str>,
    ) -> Result<Item, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut *conn, details, photo).await
    }

    /// Replace an item's fields.
    ///
    /// `photo` replaces the stored photo path when given; `None` keeps it.
    /// Returns the updated item and the path of the photo it replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    /// Returns `RepositoryError::InvalidReference` if the donor does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ItemId,
        details: &ItemDetails,
        photo: Option<&str>,
    ) -> Result<(Item, Option<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous_photo: Option<String> =
            sqlx::query_scalar("SELECT photo FROM doacoes.item WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r"
            UPDATE doacoes.item
            SET name = $2, category = $3, description = $4, available = $5,
                donor_id = $6, photo = COALESCE($7, photo)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&details.name)
        .bind(details.category)
        .bind(&details.description)
        .bind(details.available)
        .bind(details.donor)
        .bind(photo)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        let item = Self::find(&mut *tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        let replaced = previous_photo.filter(|_| photo.is_some());
        Ok((item, replaced))
    }

    /// Delete an item and the donations that reference it.
    ///
    /// Returns the photo path of the deleted item so the file can be removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ItemId) -> Result<Option<String>, RepositoryError> {
        let photo: Option<Option<String>> =
            sqlx::query_scalar("DELETE FROM doacoes.item WHERE id = $1 RETURNING photo")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        photo.ok_or(RepositoryError::NotFound)
    }

    // =========================================================================
    // Connection-level operations (usable inside a transaction)
    // =========================================================================

    /// Look an item up on an existing connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn find(conn: &mut PgConnection, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEMS} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert an item on an existing connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the donor does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        conn: &mut PgConnection,
        details: &ItemDetails,
        photo: Option<&str>,
    ) -> Result<Item, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO doacoes.item (name, category, description, available, donor_id, photo)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&details.name)
        .bind(details.category)
        .bind(&details.description)
        .bind(details.available)
        .bind(details.donor)
        .bind(photo)
        .fetch_one(&mut *conn)
        .await
        .map_err(RepositoryError::from_write)?;

        Self::find(conn, ItemId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Mark an item as given away (or back in stock).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_available(
        conn: &mut PgConnection,
        id: ItemId,
        available: bool,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE doacoes.item SET available = $2 WHERE id = $1")
            .bind(id)
            .bind(available)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
