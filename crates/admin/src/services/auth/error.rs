//! Authentication error types.

use thiserror::Error;

use doacoes_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::error::AppError;

/// Errors that can occur during authentication and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password, unknown email, or a malformed email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account not found.
    #[error("user not found")]
    UserNotFound,

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Input failed the account or password rules.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::Unauthorized("no active account found with the given credentials".to_string())
            }
            AuthError::UserNotFound => Self::NotFound("user not found".to_string()),
            AuthError::UserAlreadyExists => {
                Self::Conflict("a user with this email already exists".to_string())
            }
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::Repository(e) => e.into(),
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_string()),
        }
    }
}
