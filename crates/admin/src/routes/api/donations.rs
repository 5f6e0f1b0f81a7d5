//! Donation API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use doacoes_core::{DonationDraft, DonationId, DonorId, ItemId, RecipientId};

use crate::db::{DonationFilter, DonationRepository, RepositoryError};
use crate::error::AppError;
use crate::middleware::{Api, require};
use crate::models::{Donation, DonationSummary};
use crate::routes::payload::Payload;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/doacoes", get(list).post(create))
        .route("/api/doacoes/{id}", get(show).put(update).delete(destroy))
}

/// Optional list filter. At most one is applied, in field order.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub donor: Option<DonorId>,
    pub recipient: Option<RecipientId>,
    pub item: Option<ItemId>,
    #[serde(default)]
    pub money: bool,
}

impl ListQuery {
    const fn filter(&self) -> DonationFilter {
        if let Some(id) = self.donor {
            DonationFilter::Donor(id)
        } else if let Some(id) = self.recipient {
            DonationFilter::Recipient(id)
        } else if let Some(id) = self.item {
            DonationFilter::Item(id)
        } else if self.money {
            DonationFilter::Money
        } else {
            DonationFilter::All
        }
    }
}

fn not_found(id: DonationId) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(format!("donation {id} not found")),
        other => other.into(),
    }
}

/// List donations, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DonationSummary>>, AppError> {
    let donations = DonationRepository::new(state.pool())
        .list(query.filter())
        .await?;
    Ok(Json(donations))
}

/// Retrieve one donation.
///
/// # Errors
///
/// Returns 404 if the donation does not exist.
pub async fn show(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<DonationId>,
) -> Result<Json<DonationSummary>, AppError> {
    DonationRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("donation {id} not found")))
}

/// Record a donation of an existing item or an amount of money.
///
/// # Errors
///
/// Returns 400 if the donation fails validation or references a missing row.
#[tracing::instrument(skip_all)]
pub async fn create(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    payload: Payload,
) -> Result<(StatusCode, Json<Donation>), AppError> {
    let details = payload.parse::<DonationDraft>()?.validate()?;
    let donation = DonationRepository::new(state.pool()).create(&details).await?;

    tracing::info!(donation_id = %donation.id, money = donation.is_money(), "donation created");
    Ok((StatusCode::CREATED, Json(donation)))
}

/// Replace a donation.
///
/// # Errors
///
/// Returns 400 if the donation fails validation and 404 if it does not exist.
#[tracing::instrument(skip_all, fields(donation_id = %id))]
pub async fn update(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<DonationId>,
    payload: Payload,
) -> Result<Json<Donation>, AppError> {
    let details = payload.parse::<DonationDraft>()?.validate()?;
    let donation = DonationRepository::new(state.pool())
        .update(id, &details)
        .await
        .map_err(not_found(id))?;
    Ok(Json(donation))
}

/// Delete a donation.
///
/// # Errors
///
/// Returns 404 if the donation does not exist.
#[tracing::instrument(skip_all, fields(donation_id = %id))]
pub async fn destroy(
    _api: Api<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<DonationId>,
) -> Result<StatusCode, AppError> {
    DonationRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found(id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filter_precedence() {
        assert_eq!(ListQuery::default().filter(), DonationFilter::All);

        let query = ListQuery {
            money: true,
            ..ListQuery::default()
        };
        assert_eq!(query.filter(), DonationFilter::Money);

        let query = ListQuery {
            donor: Some(DonorId::new(3)),
            money: true,
            ..ListQuery::default()
        };
        assert_eq!(query.filter(), DonationFilter::Donor(DonorId::new(3)));
    }
}
