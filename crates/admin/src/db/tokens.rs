//! API token repository.
//!
//! Only digests are stored; see `services::tokens` for how they are derived.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use doacoes_core::UserId;

use super::RepositoryError;
use crate::models::TokenKind;

/// Repository for API bearer tokens.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token digest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        &self,
        user_id: UserId,
        kind: TokenKind,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO doacoes.api_token (user_id, kind, digest, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user_id)
        .bind(kind)
        .bind(digest)
        .bind(expires_at)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        Ok(())
    }

    /// Find the owner of an unexpired token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_owner(
        &self,
        kind: TokenKind,
        digest: &str,
    ) -> Result<Option<UserId>, RepositoryError> {
        let user_id = sqlx::query_scalar::<_, UserId>(
            r"
            SELECT user_id FROM doacoes.api_token
            WHERE kind = $1 AND digest = $2 AND expires_at > NOW()
            ",
        )
        .bind(kind)
        .bind(digest)
        .fetch_optional(self.pool)
        .await?;

        Ok(user_id)
    }

    /// Drop every expired token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM doacoes.api_token WHERE expires_at <= NOW()")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Revoke every token of a user (after a password change).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM doacoes.api_token WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
