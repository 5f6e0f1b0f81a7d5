//! Donation repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use doacoes_core::{
    DonationDetails, DonationId, DonationTarget, DonorId, ItemId, MonetaryAmount, RecipientId,
};

use super::RepositoryError;
use super::items::ItemRepository;
use crate::models::{Donation, DonationSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct DonationRow {
    id: i32,
    donor_id: i32,
    recipient_id: Option<i32>,
    item_id: Option<i32>,
    amount: Option<Decimal>,
    notes: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = RepositoryError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        let target = match (row.item_id, row.amount) {
            (Some(item), None) => DonationTarget::Item(ItemId::new(item)),
            (None, Some(amount)) => DonationTarget::Money(MonetaryAmount::new(amount).map_err(
                |e| RepositoryError::DataCorruption(format!("invalid amount in database: {e}")),
            )?),
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "donation {} must have exactly one of item or amount",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: DonationId::new(row.id),
            donor: DonorId::new(row.donor_id),
            recipient: row.recipient_id.map(RecipientId::new),
            target,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DonationSummaryRow {
    #[sqlx(flatten)]
    donation: DonationRow,
    donor_name: String,
    recipient_name: Option<String>,
    item_name: Option<String>,
}

impl TryFrom<DonationSummaryRow> for DonationSummary {
    type Error = RepositoryError;

    fn try_from(row: DonationSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            donation: row.donation.try_into()?,
            donor_name: row.donor_name,
            recipient_name: row.recipient_name,
            item_name: row.item_name,
        })
    }
}

const DONATION_COLUMNS: &str = "id, donor_id, recipient_id, item_id, amount, notes, created_at";

const SELECT_SUMMARIES: &str = r"
    SELECT dn.id, dn.donor_id, dn.recipient_id, dn.item_id, dn.amount, dn.notes, dn.created_at,
           d.name AS donor_name, r.name AS recipient_name, i.name AS item_name
    FROM doacoes.donation dn
    JOIN doacoes.donor d ON d.id = dn.donor_id
    LEFT JOIN doacoes.recipient r ON r.id = dn.recipient_id
    LEFT JOIN doacoes.item i ON i.id = dn.item_id
";

/// Which donations to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationFilter {
    All,
    /// Cash donations only.
    Money,
    Donor(DonorId),
    Recipient(RecipientId),
    Item(ItemId),
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for donations.
pub struct DonationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DonationRepository<'a> {
    /// Create a new donation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List donations, newest first, with the names they reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self, filter: DonationFilter) -> Result<Vec<DonationSummary>, RepositoryError> {
        const ORDER: &str = "ORDER BY dn.created_at DESC, dn.id DESC";

        let query = match filter {
            DonationFilter::All => {
                sqlx::query_as::<_, DonationSummaryRow>(&format!("{SELECT_SUMMARIES} {ORDER}"))
                    .fetch_all(self.pool)
                    .await
            }
            DonationFilter::Money => {
                sqlx::query_as::<_, DonationSummaryRow>(&format!(
                    "{SELECT_SUMMARIES} WHERE dn.amount IS NOT NULL {ORDER}"
                ))
                .fetch_all(self.pool)
                .await
            }
            DonationFilter::Donor(id) => {
                sqlx::query_as::<_, DonationSummaryRow>(&format!(
                    "{SELECT_SUMMARIES} WHERE dn.donor_id = $1 {ORDER}"
                ))
                .bind(id)
                .fetch_all(self.pool)
                .await
            }
            DonationFilter::Recipient(id) => {
                sqlx::query_as::<_, DonationSummaryRow>(&format!(
                    "{SELECT_SUMMARIES} WHERE dn.recipient_id = $1 {ORDER}"
                ))
                .bind(id)
                .fetch_all(self.pool)
                .await
            }
            DonationFilter::Item(id) => {
                sqlx::query_as::<_, DonationSummaryRow>(&format!(
                    "{SELECT_SUMMARIES} WHERE dn.item_id = $1 {ORDER}"
                ))
                .bind(id)
                .fetch_all(self.pool)
                .await
            }
        };

        query?.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a donation with the names it references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: DonationId) -> Result<Option<DonationSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, DonationSummaryRow>(&format!(
            "{SELECT_SUMMARIES} WHERE dn.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Record a validated donation.
    ///
    /// An item handed to a recipient stops being available.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if a referenced row does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, details: &DonationDetails) -> Result<Donation, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let donation = Self::insert(&mut *tx, details).await?;
        if let (DonationTarget::Item(item), Some(_)) = (details.target, details.recipient) {
            ItemRepository::set_available(&mut *tx, item, false).await?;
        }
        tx.commit().await?;
        Ok(donation)
    }

    /// Replace a donation's fields. The creation time is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the donation does not exist.
    /// Returns `RepositoryError::InvalidReference` if a referenced row does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: DonationId,
        details: &DonationDetails,
    ) -> Result<Donation, RepositoryError> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            r"
            UPDATE doacoes.donation
            SET donor_id = $2, recipient_id = $3, item_id = $4, amount = $5, notes = $6
            WHERE id = $1
            RETURNING {DONATION_COLUMNS}
            "
        ))
        .bind(id)
        .bind(details.donor)
        .bind(details.recipient)
        .bind(details.target.item())
        .bind(details.target.amount())
        .bind(&details.notes)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a donation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the donation does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: DonationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM doacoes.donation WHERE id = $1")
            .bind(id)
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

    /// Insert a donation on an existing connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if a referenced row does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        conn: &mut PgConnection,
        details: &DonationDetails,
    ) -> Result<Donation, RepositoryError> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            r"
            INSERT INTO doacoes.donation (donor_id, recipient_id, item_id, amount, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DONATION_COLUMNS}
            "
        ))
        .bind(details.donor)
        .bind(details.recipient)
        .bind(details.target.item())
        .bind(details.target.amount())
        .bind(&details.notes)
        .fetch_one(&mut *conn)
        .await
        .map_err(RepositoryError::from_write)?;

        row.try_into()
    }
}
