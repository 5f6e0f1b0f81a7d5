//! Opaque API bearer tokens.
//!
//! A token is 32 random bytes, hex encoded. The database stores only an
//! HMAC-SHA256 digest keyed by the session secret, so a leaked table does not
//! yield usable tokens.

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use sqlx::PgPool;
use thiserror::Error;

use crate::config::TokenConfig;
use crate::db::{RepositoryError, TokenRepository, UserRepository};
use crate::error::AppError;
use crate::models::{CurrentUser, IssuedTokens, TokenKind, User};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_BYTES: usize = 32;

/// Errors from token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is invalid or expired")]
    Invalid,

    #[error("token key rejected")]
    Key,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::Unauthorized(err.to_string()),
            TokenError::Key => Self::Internal(err.to_string()),
            TokenError::Repository(e) => e.into(),
        }
    }
}

/// Generate a fresh random token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest under which a token is stored.
///
/// # Errors
///
/// Returns `TokenError::Key` if the HMAC key is rejected.
pub fn token_digest(secret: &SecretString, token: &str) -> Result<String, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| TokenError::Key)?;
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Issues, refreshes and checks bearer tokens.
pub struct TokenService<'a> {
    tokens: TokenRepository<'a>,
    users: UserRepository<'a>,
    secret: &'a SecretString,
    lifetimes: &'a TokenConfig,
}

impl<'a> TokenService<'a> {
    /// Create a new token service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, secret: &'a SecretString, lifetimes: &'a TokenConfig) -> Self {
        Self {
            tokens: TokenRepository::new(pool),
            users: UserRepository::new(pool),
            secret,
            lifetimes,
        }
    }

    /// Issue an access and a refresh token for an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Repository` if the digests cannot be stored.
    pub async fn issue(&self, user: User) -> Result<IssuedTokens, TokenError> {
        let access = self.store(&user, TokenKind::Access).await?;
        let refresh = self.store(&user, TokenKind::Refresh).await?;

        // Opportunistic cleanup; a failure here must not block the login.
        if let Err(e) = self.tokens.delete_expired().await {
            tracing::warn!(error = %e, "failed to purge expired tokens");
        }

        Ok(IssuedTokens {
            access,
            refresh,
            user,
        })
    }

    /// Trade a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the refresh token is unknown or expired.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, TokenError> {
        let user = self.resolve(TokenKind::Refresh, refresh_token).await?;
        self.store(&user, TokenKind::Access).await
    }

    /// Resolve an access token to the caller.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the token is unknown, expired, or its
    /// account no longer exists.
    pub async fn authenticate(&self, access_token: &str) -> Result<CurrentUser, TokenError> {
        let user = self.resolve(TokenKind::Access, access_token).await?;
        Ok(CurrentUser::from(&user))
    }

    async fn resolve(&self, kind: TokenKind, token: &str) -> Result<User, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Invalid);
        }
        let digest = token_digest(self.secret, token)?;

        let user_id = self
            .tokens
            .find_owner(kind, &digest)
            .await?
            .ok_or(TokenError::Invalid)?;

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(TokenError::Invalid)
    }

    async fn store(&self, user: &User, kind: TokenKind) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.lifetimes.access_ttl,
            TokenKind::Refresh => self.lifetimes.refresh_ttl,
        };
        let token = generate_token();
        let digest = token_digest(self.secret, &token)?;

        self.tokens
            .insert(user.id, kind, &digest, Utc::now() + ttl)
            .await?;

        Ok(token)
    }
}
