//! Donor and recipient API, one generic set of handlers per table.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use doacoes_core::ContactDraft;

use crate::db::{ContactRepository, ContactTable, RepositoryError};
use crate::error::AppError;
use crate::middleware::{Api, require};
use crate::models::Contact;
use crate::routes::payload::Payload;
use crate::state::AppState;

/// Routes for one contact table, mounted at `base`.
pub fn router<T: ContactTable>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(list::<T>).post(create::<T>))
        .route(
            &format!("{base}/{{id}}"),
            get(show::<T>).put(update::<T>).delete(destroy::<T>),
        )
}

fn not_found<T: ContactTable>(id: T::Id) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(format!("{} {id} not found", T::NOUN)),
        other => other.into(),
    }
}

/// List every row, by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list<T: ContactTable>(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Contact<T::Id>>>, AppError> {
    Ok(Json(ContactRepository::<T>::new(state.pool()).list_all().await?))
}

/// Retrieve one row.
///
/// # Errors
///
/// Returns 404 if the row does not exist.
pub async fn show<T: ContactTable>(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<T::Id>,
) -> Result<Json<Contact<T::Id>>, AppError> {
    ContactRepository::<T>::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} {id} not found", T::NOUN)))
}

/// Create a row.
///
/// # Errors
///
/// Returns 400 if the contact fails validation.
#[tracing::instrument(skip_all, fields(table = T::TABLE))]
pub async fn create<T: ContactTable>(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    payload: Payload,
) -> Result<(StatusCode, Json<Contact<T::Id>>), AppError> {
    let details = payload.parse::<ContactDraft>()?.validate()?;
    let contact = ContactRepository::<T>::new(state.pool())
        .create(&details)
        .await?;

    tracing::info!(id = %contact.id, "contact created");
    Ok((StatusCode::CREATED, Json(contact)))
}

/// Replace a row.
///
/// # Errors
///
/// Returns 400 if the contact fails validation and 404 if it does not exist.
#[tracing::instrument(skip_all, fields(table = T::TABLE, id = %id))]
pub async fn update<T: ContactTable>(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<T::Id>,
    payload: Payload,
) -> Result<Json<Contact<T::Id>>, AppError> {
    let details = payload.parse::<ContactDraft>()?.validate()?;
    let contact = ContactRepository::<T>::new(state.pool())
        .update(id, &details)
        .await
        .map_err(not_found::<T>(id))?;
    Ok(Json(contact))
}

/// Delete a row and its donations.
///
/// # Errors
///
/// Returns 404 if the row does not exist.
#[tracing::instrument(skip_all, fields(table = T::TABLE, id = %id))]
pub async fn destroy<T: ContactTable>(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<T::Id>,
) -> Result<StatusCode, AppError> {
    ContactRepository::<T>::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found::<T>(id))?;

    tracing::info!("contact deleted");
    Ok(StatusCode::NO_CONTENT)
}
