//! Donation wizard API.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Serialize;

use doacoes_core::DonationId;

use crate::error::AppError;
use crate::middleware::{Api, require};
use crate::routes::payload::Payload;
use crate::services::{WizardInput, WizardService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/wizard/doacoes", post(register))
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: DonationId,
}

/// Register a donation together with a new or existing donor and recipient.
///
/// Accepts JSON, or multipart with an `item_photo` file.
///
/// # Errors
///
/// Returns 400 if any part of the request is invalid (nothing is written)
/// and 404 if an existing donor or recipient is missing.
#[tracing::instrument(skip_all, fields(user_id = %api.user.id))]
pub async fn register(
    api: Api<require::RegisterDonations>,
    State(state): State<AppState>,
    mut payload: Payload,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let photo = payload.take_photo();
    let plan = payload.parse::<WizardInput>()?.plan(photo)?;

    let donation = WizardService::new(state.pool(), state.media())
        .run(&plan)
        .await?;

    Ok((StatusCode::CREATED, Json(Created { id: donation.id })))
}
