//! API token types.

use serde::Serialize;

use super::user::User;

/// Whether a token authenticates requests or mints new access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "doacoes.token_kind", rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Response of `POST /api/token/`.
///
/// The raw token strings exist only here; the database keeps digests.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedTokens {
    pub access: String,
    pub refresh: String,
    pub user: User,
}
