//! Authentication extractors.
//!
//! Pages authenticate with the session cookie and answer failures with a
//! redirect to the login page. The JSON API also accepts an
//! `Authorization: Bearer <access token>` header and answers failures with
//! JSON errors.
//!
//! Both extractors are parameterised by a [`Requirement`], which names the
//! capability the handler needs:
//!
//! ```rust,ignore
//! async fn list(page: Page<require::ManageRecords>) -> impl IntoResponse {
//!     format!("Hello, {}!", page.user.full_name)
//! }
//! ```

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use doacoes_core::Capability;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::services::TokenService;
use crate::state::AppState;

// =============================================================================
// Requirements
// =============================================================================

/// What a handler requires of its caller beyond being logged in.
pub trait Requirement: Send + Sync + 'static {
    /// Capability to check, or `None` for any logged-in user.
    const CAPABILITY: Option<Capability>;
}

/// Marker types for [`Page`] and [`Api`].
pub mod require {
    use super::{Capability, Requirement};

    /// Any logged-in user.
    pub struct Login;

    pub struct ManageUsers;
    pub struct ManageRecords;
    pub struct RegisterDonations;
    pub struct ViewDashboard;

    impl Requirement for Login {
        const CAPABILITY: Option<Capability> = None;
    }

    impl Requirement for ManageUsers {
        const CAPABILITY: Option<Capability> = Some(Capability::ManageUsers);
    }

    impl Requirement for ManageRecords {
        const CAPABILITY: Option<Capability> = Some(Capability::ManageRecords);
    }

    impl Requirement for RegisterDonations {
        const CAPABILITY: Option<Capability> = Some(Capability::RegisterDonations);
    }

    impl Requirement for ViewDashboard {
        const CAPABILITY: Option<Capability> = Some(Capability::ViewDashboard);
    }
}

fn permitted<R: Requirement>(user: &CurrentUser) -> bool {
    R::CAPABILITY.is_none_or(|capability| user.can(capability))
}

/// Load the session user and refresh it from the database.
///
/// Returns `None` when nobody is logged in or the account is gone.
async fn session_user(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<CurrentUser>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let stored = match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load session, treating request as anonymous");
            None
        }
    };
    let Some(stored) = stored else {
        return Ok(None);
    };

    let user = UserRepository::new(state.pool()).get_by_id(stored.id).await?;
    Ok(user.as_ref().map(CurrentUser::from))
}

// =============================================================================
// Pages
// =============================================================================

/// Logged-in user of a page request, holding requirement `R`.
pub struct Page<R: Requirement = require::Login> {
    pub user: CurrentUser,
    _requirement: PhantomData<R>,
}

/// Why a page request was turned away.
pub enum PageRejection {
    /// Nobody is logged in.
    RedirectToLogin,
    /// The user's role lacks the capability.
    Forbidden,
    Error(AppError),
}

impl IntoResponse for PageRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to access this page",
            )
                .into_response(),
            Self::Error(e) => e.into_response(),
        }
    }
}

impl<R: Requirement> FromRequestParts<AppState> for Page<R> {
    type Rejection = PageRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = session_user(parts, state)
            .await
            .map_err(PageRejection::Error)?
            .ok_or(PageRejection::RedirectToLogin)?;

        if !permitted::<R>(&user) {
            return Err(PageRejection::Forbidden);
        }

        Ok(Self {
            user,
            _requirement: PhantomData,
        })
    }
}

/// The logged-in user of a page request, if any.
pub struct OptionalUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = PageRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_user(parts, state)
            .await
            .map(Self)
            .map_err(PageRejection::Error)
    }
}

// =============================================================================
// API
// =============================================================================

/// Caller of an API request, holding requirement `R`.
///
/// A bearer token takes precedence over the session; an invalid token is
/// rejected even if a session exists.
pub struct Api<R: Requirement = require::Login> {
    pub user: CurrentUser,
    _requirement: PhantomData<R>,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}

impl<R: Requirement> FromRequestParts<AppState> for Api<R> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = if let Some(token) = bearer_token(parts) {
            let config = state.config();
            TokenService::new(state.pool(), &config.session_secret, &config.tokens)
                .authenticate(token)
                .await?
        } else {
            session_user(parts, state).await?.ok_or_else(|| {
                AppError::Unauthorized("authentication credentials were not provided".to_string())
            })?
        };

        if !permitted::<R>(&user) {
            return Err(AppError::Forbidden(
                "you do not have permission to perform this action".to_string(),
            ));
        }

        crate::error::set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));

        Ok(Self {
            user,
            _requirement: PhantomData,
        })
    }
}

// =============================================================================
// Session helpers
// =============================================================================

/// Log a user in: rotate the session id and store the user.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log the current user out, discarding the whole session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
