//! Staff account API.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};

use doacoes_core::{Capability, Role, UserId};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::middleware::{Api, require};
use crate::models::User;
use crate::routes::payload::Payload;
use crate::services::auth::{AccountDraft, PasswordChange};
use crate::services::AuthService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/me", get(me))
        .route("/api/users/create_gerente", post(create_gerente))
        .route("/api/users/{id}", get(show).put(update).delete(destroy))
        .route("/api/users/{id}/change_password", put(change_password))
}

async fn find(state: &AppState, id: UserId) -> Result<User, AppError> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
}

/// List every account.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(_api: Api, State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(UserRepository::new(state.pool()).list_all().await?))
}

/// The caller's own account.
///
/// # Errors
///
/// Returns 404 if the account was deleted meanwhile.
pub async fn me(api: Api, State(state): State<AppState>) -> Result<Json<User>, AppError> {
    Ok(Json(find(&state, api.user.id).await?))
}

/// Retrieve an account.
///
/// # Errors
///
/// Returns 404 if the account does not exist.
pub async fn show(
    _api: Api,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(find(&state, id).await?))
}

/// Create an account with any role (defaults to `GERENTE`).
///
/// # Errors
///
/// Returns 400 on invalid input and 409 if the email is taken.
#[tracing::instrument(skip_all)]
pub async fn create(
    _api: Api<require::ManageUsers>,
    State(state): State<AppState>,
    payload: Payload,
) -> Result<(StatusCode, Json<User>), AppError> {
    let account = payload.parse::<AccountDraft>()?.validate_new(Role::Gerente)?;
    let user = AuthService::new(state.pool()).register(&account).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Create an account that is always a `GERENTE`, whatever role is posted.
///
/// # Errors
///
/// Returns 400 on invalid input and 409 if the email is taken.
#[tracing::instrument(skip_all)]
pub async fn create_gerente(
    _api: Api<require::ManageUsers>,
    State(state): State<AppState>,
    payload: Payload,
) -> Result<(StatusCode, Json<User>), AppError> {
    let mut draft = payload.parse::<AccountDraft>()?;
    draft.role = None;
    let account = draft.validate_new(Role::Gerente)?;
    let user = AuthService::new(state.pool()).register(&account).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Replace an account's profile.
///
/// Allowed to user managers and to the account itself. Only user managers
/// may change a role; anyone else keeps their current one.
///
/// # Errors
///
/// Returns 403 when editing someone else without permission, 404 if the
/// account does not exist and 409 if the email is taken.
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn update(
    api: Api,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    payload: Payload,
) -> Result<Json<User>, AppError> {
    let manager = api.user.can(Capability::ManageUsers);
    if !manager && api.user.id != id {
        return Err(AppError::Forbidden(
            "you can only edit your own account".to_string(),
        ));
    }

    let current = find(&state, id).await?;
    let mut draft = payload.parse::<AccountDraft>()?;
    if !manager {
        draft.role = None;
    }
    let profile = draft.validate_profile(current.role)?;

    let user = AuthService::new(state.pool())
        .update_profile(id, &profile)
        .await?;
    Ok(Json(user))
}

/// Delete an account. An account cannot delete itself.
///
/// # Errors
///
/// Returns 404 if the account does not exist and 409 for the caller's own
/// account.
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn destroy(
    api: Api<require::ManageUsers>,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    if api.user.id == id {
        return Err(AppError::Conflict(
            "you cannot delete your own account".to_string(),
        ));
    }

    UserRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound(format!("user {id} not found")),
            other => other.into(),
        })?;

    tracing::info!(deleted_by = %api.user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Change a password: `{old_password, password, password2}`.
///
/// Allowed on one's own account, or on any account for user managers. The
/// current password of the target account is always required.
///
/// # Errors
///
/// Returns 403 without permission, 400 on a wrong current password or a
/// rejected new one.
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn change_password(
    api: Api,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    payload: Payload,
) -> Result<Json<serde_json::Value>, AppError> {
    if api.user.id != id && !api.user.can(Capability::ManageUsers) {
        return Err(AppError::Forbidden(
            "you can only change your own password".to_string(),
        ));
    }

    let change: PasswordChange = payload.parse()?;
    AuthService::new(state.pool())
        .change_password(id, &change)
        .await?;

    Ok(Json(serde_json::json!({ "status": "password changed" })))
}
