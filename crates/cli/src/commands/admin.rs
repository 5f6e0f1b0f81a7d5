//! Staff account bootstrap.
//!
//! # Usage
//!
//! ```bash
//! doacoes-cli admin create --email admin@ong.org --password 's3cret-pass' --name "Ana Lima"
//! ```
//!
//! Every flag has a default (`admin@admin.com` / `admin123` /
//! `Administrador`) so a fresh install can be bootstrapped with
//! `doacoes-cli admin create`. Change that password right away.

use doacoes_admin::services::{AuthError, AuthService, auth::AccountDraft};
use doacoes_core::{Role, ValidationErrors};

use super::{ConnectError, connect};

/// Errors that can occur during account operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The email, name or password was rejected.
    #[error("Invalid account: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// The draft an `admin create` invocation stands for.
fn draft(email: &str, password: &str, name: &str) -> AccountDraft {
    AccountDraft {
        email: Some(email.to_owned()),
        full_name: Some(name.to_owned()),
        role: Some(Role::Admin.as_str().to_owned()),
        password: Some(password.to_owned()),
        password2: Some(password.to_owned()),
    }
}

/// Create an ADMIN account.
///
/// An existing account with the same email is left untouched: the command
/// warns and succeeds.
pub async fn create_user(email: &str, password: &str, name: &str) -> Result<(), AdminError> {
    let account = draft(email, password, name).validate_new(Role::Admin)?;

    let pool = connect().await?;

    match AuthService::new(&pool).register(&account).await {
        Ok(user) => {
            tracing::info!(
                "Admin user created successfully! ID: {}, Email: {}",
                user.id,
                user.email
            );
            Ok(())
        }
        Err(AuthError::UserAlreadyExists) => {
            tracing::warn!("A user with email {} already exists; nothing to do", email);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_account_is_valid_admin() {
        let account = draft("admin@admin.com", "admin123", "Administrador")
            .validate_new(Role::Admin)
            .unwrap();
        assert_eq!(account.profile.role, Role::Admin);
        assert_eq!(account.profile.email.as_str(), "admin@admin.com");
    }

    #[test]
    fn test_short_password_rejected() {
        let errors = draft("admin@admin.com", "short", "Admin")
            .validate_new(Role::Admin)
            .unwrap_err();
        assert!(errors.has("password"));
    }
}
