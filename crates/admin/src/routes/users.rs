//! Account management page (ADMIN only).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use doacoes_core::{Role, UserId, ValidationErrors};

use crate::{
    db::UserRepository,
    error::AppError,
    filters,
    middleware::{Page, require},
    models::{CurrentUser, User},
    routes::payload::Payload,
    services::{AuthError, AuthService, auth::AccountDraft},
    state::AppState,
};

/// Account row as displayed.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: &'static str,
    pub last_access: String,
    pub is_self: bool,
}

impl UserRow {
    fn new(user: &User, current: &CurrentUser) -> Self {
        Self {
            id: user.id,
            email: user.email.to_string(),
            full_name: user.full_name.clone(),
            role: user.role.label(),
            last_access: user
                .last_access
                .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
            is_self: user.id == current.id,
        }
    }
}

/// Creation form values, echoed back when validation fails. Passwords are
/// never echoed.
#[derive(Debug, Clone)]
pub struct UserForm {
    pub email: String,
    pub full_name: String,
    pub role: String,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            full_name: String::new(),
            role: Role::Gerente.as_str().to_owned(),
        }
    }
}

impl From<&AccountDraft> for UserForm {
    fn from(draft: &AccountDraft) -> Self {
        Self {
            email: draft.email.clone().unwrap_or_default(),
            full_name: draft.full_name.clone().unwrap_or_default(),
            role: draft
                .role
                .clone()
                .unwrap_or_else(|| Role::Gerente.as_str().to_owned()),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub user: CurrentUser,
    pub users: Vec<UserRow>,
    pub roles: [Role; 2],
    pub form: UserForm,
    pub errors: ValidationErrors,
}

async fn render(
    state: &AppState,
    user: CurrentUser,
    form: UserForm,
    errors: ValidationErrors,
) -> Result<UsersTemplate, AppError> {
    let users = UserRepository::new(state.pool()).list_all().await?;

    Ok(UsersTemplate {
        users: users.iter().map(|u| UserRow::new(u, &user)).collect(),
        user,
        roles: Role::ALL,
        form,
        errors,
    })
}

/// Account list with the creation form.
///
/// # Errors
///
/// Returns an error if the database query fails.
#[instrument(skip_all)]
pub async fn index(
    page: Page<require::ManageUsers>,
    State(state): State<AppState>,
) -> Result<UsersTemplate, AppError> {
    render(&state, page.user, UserForm::default(), ValidationErrors::new()).await
}

/// Create an account from the list page's form.
///
/// # Errors
///
/// Returns an error if the database query fails.
#[instrument(skip_all)]
pub async fn create(
    page: Page<require::ManageUsers>,
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Response, AppError> {
    let draft: AccountDraft = payload.parse()?;

    let errors = match draft.validate_new(Role::Gerente) {
        Ok(account) => match AuthService::new(state.pool()).register(&account).await {
            Ok(created) => {
                tracing::info!(user_id = %created.id, created_by = %page.user.id, "user created");
                return Ok(Redirect::to("/users").into_response());
            }
            Err(AuthError::UserAlreadyExists) => {
                ValidationErrors::single("email", "a user with this email already exists")
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    let template = render(&state, page.user, UserForm::from(&draft), errors).await?;
    Ok((StatusCode::BAD_REQUEST, template).into_response())
}

/// Delete an account other than one's own.
///
/// # Errors
///
/// Returns 409 for one's own account and 404 for an unknown one.
#[instrument(skip_all, fields(user_id = %id))]
pub async fn delete(
    page: Page<require::ManageUsers>,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Redirect, AppError> {
    if page.user.id == id {
        return Err(AppError::Conflict(
            "you cannot delete your own account".to_string(),
        ));
    }

    UserRepository::new(state.pool()).delete(id).await?;

    tracing::info!(deleted_by = %page.user.id, "user deleted");
    Ok(Redirect::to("/users"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use doacoes_core::Email;

    use super::*;

    #[test]
    fn test_user_row() {
        let user = User {
            id: UserId::new(2),
            email: Email::parse("gerente@ong.org").unwrap(),
            full_name: "Gerente".to_string(),
            role: Role::Gerente,
            created_at: Utc::now(),
            last_access: None,
        };
        let current = CurrentUser::from(&user);

        let row = UserRow::new(&user, &current);
        assert!(row.is_self);
        assert_eq!(row.role, "Gerente");
        assert_eq!(row.last_access, "never");
    }

    #[test]
    fn test_form_does_not_echo_passwords() {
        let draft = AccountDraft {
            email: Some("x@y.org".to_string()),
            password: Some("secret-pass".to_string()),
            ..AccountDraft::default()
        };
        let form = UserForm::from(&draft);
        assert_eq!(form.email, "x@y.org");
        assert_eq!(form.role, "GERENTE");
    }
}
