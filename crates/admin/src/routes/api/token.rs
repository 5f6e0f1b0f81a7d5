//! Token issuance.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::IssuedTokens;
use crate::routes::payload::Payload;
use crate::services::{AuthService, TokenService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/token", post(obtain))
        .route("/api/token/refresh", post(refresh))
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Exchange credentials for an access and a refresh token.
///
/// # Errors
///
/// Returns 401 if the credentials are wrong.
#[tracing::instrument(skip_all)]
pub async fn obtain(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<IssuedTokens>, AppError> {
    let credentials: Credentials = payload.parse()?;

    let user = AuthService::new(state.pool())
        .login(&credentials.email, &credentials.password)
        .await?;

    let config = state.config();
    let tokens = TokenService::new(state.pool(), &config.session_secret, &config.tokens)
        .issue(user)
        .await?;

    Ok(Json(tokens))
}

/// Exchange a refresh token for a new access token.
///
/// # Errors
///
/// Returns 401 if the refresh token is unknown or expired.
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<RefreshResponse>, AppError> {
    let request: RefreshRequest = payload.parse()?;

    let config = state.config();
    let access = TokenService::new(state.pool(), &config.session_secret, &config.tokens)
        .refresh(&request.refresh)
        .await?;

    Ok(Json(RefreshResponse { access }))
}
