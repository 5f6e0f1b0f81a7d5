//! Item API. Create and update accept a `photo` file in multipart bodies.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use doacoes_core::{ItemDraft, ItemId};

use crate::db::{ItemRepository, RepositoryError};
use crate::error::AppError;
use crate::middleware::{Api, require};
use crate::models::Item;
use crate::routes::payload::Payload;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/itens", get(list).post(create))
        .route("/api/itens/{id}", get(show).put(update).delete(destroy))
}

fn not_found(id: ItemId) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(format!("item {id} not found")),
        other => other.into(),
    }
}

/// List every item, by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Item>>, AppError> {
    Ok(Json(ItemRepository::new(state.pool()).list_all().await?))
}

/// Retrieve one item.
///
/// # Errors
///
/// Returns 404 if the item does not exist.
pub async fn show(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<Json<Item>, AppError> {
    ItemRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("item {id} not found")))
}

/// Create an item, storing its photo if one is attached.
///
/// # Errors
///
/// Returns 400 if the item or photo fails validation.
#[tracing::instrument(skip_all)]
pub async fn create(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    mut payload: Payload,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let details = payload.parse::<ItemDraft>()?.validate()?;

    let photo = match payload.take_photo() {
        Some(upload) => Some(state.media().save(&upload).await?),
        None => None,
    };

    match ItemRepository::new(state.pool())
        .create(&details, photo.as_deref())
        .await
    {
        Ok(item) => {
            tracing::info!(item_id = %item.id, "item created");
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(e) => {
            if let Some(path) = &photo {
                state.media().remove(path).await;
            }
            Err(e.into())
        }
    }
}

/// Replace an item. The stored photo is kept unless a new one is attached.
///
/// # Errors
///
/// Returns 400 if the item or photo fails validation and 404 if the item
/// does not exist.
#[tracing::instrument(skip_all, fields(item_id = %id))]
pub async fn update(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    mut payload: Payload,
) -> Result<Json<Item>, AppError> {
    let details = payload.parse::<ItemDraft>()?.validate()?;

    let photo = match payload.take_photo() {
        Some(upload) => Some(state.media().save(&upload).await?),
        None => None,
    };

    match ItemRepository::new(state.pool())
        .update(id, &details, photo.as_deref())
        .await
    {
        Ok((item, replaced)) => {
            if let Some(old) = replaced {
                state.media().remove(&old).await;
            }
            Ok(Json(item))
        }
        Err(e) => {
            if let Some(path) = &photo {
                state.media().remove(path).await;
            }
            Err(not_found(id)(e))
        }
    }
}

/// Delete an item, its donations and its photo.
///
/// # Errors
///
/// Returns 404 if the item does not exist.
#[tracing::instrument(skip_all, fields(item_id = %id))]
pub async fn destroy(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<StatusCode, AppError> {
    let photo = ItemRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found(id))?;

    if let Some(path) = photo {
        state.media().remove(&path).await;
    }

    tracing::info!("item deleted");
    Ok(StatusCode::NO_CONTENT)
}
