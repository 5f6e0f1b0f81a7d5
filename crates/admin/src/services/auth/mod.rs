//! Password authentication and account management.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;

use doacoes_core::validation::{lenient, validate_new_password};
use doacoes_core::{Email, Role, UserId, ValidationErrors};

use crate::db::RepositoryError;
use crate::db::TokenRepository;
use crate::db::users::{NewUser, UserRepository, UserUpdate};
use crate::models::User;

// =============================================================================
// Account input
// =============================================================================

/// Unvalidated account fields, as posted to the API or the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountDraft {
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub role: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password2: Option<String>,
}

/// Profile fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub email: Email,
    pub full_name: String,
    pub role: Role,
}

/// A new account that passed validation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub profile: Profile,
    pub password: String,
}

impl AccountDraft {
    /// Validate the profile fields. `role` falls back to `default_role`.
    ///
    /// # Errors
    ///
    /// Returns every failure found in email, full name and role.
    pub fn validate_profile(&self, default_role: Role) -> Result<Profile, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = match self.email.as_deref().map(Email::parse) {
            Some(Ok(email)) => Some(email),
            Some(Err(e)) => {
                errors.add("email", e.to_string());
                None
            }
            None => {
                errors.add("email", "this field is required");
                None
            }
        };

        let full_name = self.full_name.clone().unwrap_or_default();
        if full_name.is_empty() {
            errors.add("full_name", "this field is required");
        }

        let role = match self.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => role,
            Some(Err(e)) => {
                errors.add("role", e);
                default_role
            }
            None => default_role,
        };

        match email {
            Some(email) if errors.is_empty() => Ok(Profile {
                email,
                full_name,
                role,
            }),
            _ => Err(errors),
        }
    }

    /// Validate a new account: profile plus password and confirmation.
    ///
    /// # Errors
    ///
    /// Returns every failure found, including the password rules.
    pub fn validate_new(&self, default_role: Role) -> Result<NewAccount, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let profile = self
            .validate_profile(default_role)
            .map_err(|e| errors.extend(e))
            .ok();

        match (self.password.as_deref(), self.password2.as_deref()) {
            (None | Some(""), _) => errors.add("password", "this field is required"),
            (Some(_), None | Some("")) => errors.add("password2", "password confirmation is required"),
            (Some(password), Some(confirmation)) => {
                if let Err(e) = validate_new_password(password, confirmation) {
                    errors.extend(e);
                }
            }
        }

        match profile {
            Some(profile) if errors.is_empty() => Ok(NewAccount {
                profile,
                password: self.password.clone().unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }
}

/// Body of a password change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChange {
    #[serde(default)]
    pub old_password: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password2: Option<String>,
}

// =============================================================================
// Service
// =============================================================================

/// Authentication and account service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    /// Check an email and password and record the access.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email, a wrong
    /// password, or an email that does not parse.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (mut user, hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;

        self.users.touch_last_access(user.id).await?;
        user.last_access = Some(chrono::Utc::now());

        tracing::info!(user_id = %user.id, role = %user.role, "user authenticated");
        Ok(user)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(&self, account: &NewAccount) -> Result<User, AuthError> {
        let password_hash = hash_password(&account.password)?;

        let user = self
            .users
            .create(&NewUser {
                email: &account.profile.email,
                full_name: &account.profile.full_name,
                role: account.profile.role,
                password_hash: &password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Replace an account's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account does not exist, or
    /// `AuthError::UserAlreadyExists` if the new email is taken.
    pub async fn update_profile(&self, id: UserId, profile: &Profile) -> Result<User, AuthError> {
        self.users
            .update(
                id,
                &UserUpdate {
                    email: &profile.email,
                    full_name: &profile.full_name,
                    role: profile.role,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Change a password after checking the current one.
    ///
    /// Every API token of the account is revoked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` when a field is missing, the current
    /// password is wrong, or the new password breaks the rules.
    pub async fn change_password(
        &self,
        id: UserId,
        change: &PasswordChange,
    ) -> Result<(), AuthError> {
        let required = |field: &str, value: Option<&String>| -> Result<String, AuthError> {
            value
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| ValidationErrors::single(field, "this field is required").into())
        };

        let old_password = required("old_password", change.old_password.as_ref())?;
        let password = required("password", change.password.as_ref())?;
        let confirmation = required("password2", change.password2.as_ref())?;

        let hash = self.users.get_password_hash(id).await.map_err(|e| match e {
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        })?;

        if verify_password(&old_password, &hash).is_err() {
            return Err(ValidationErrors::single("old_password", "current password is incorrect").into());
        }

        validate_new_password(&password, &confirmation)?;

        let new_hash = hash_password(&password)?;
        self.users.set_password_hash(id, &new_hash).await?;
        let revoked = self.tokens.delete_for_user(id).await?;

        tracing::info!(user_id = %id, revoked, "password changed");
        Ok(())
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or unreadable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
