//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (database ping)
//!
//! # Pages (session cookie)
//! GET  /                           - Redirect to the caller's home page
//! GET  /login, POST /login         - Password login
//! POST /logout                     - End the session
//! GET  /dashboard                  - Record counts and recent donations
//! GET  /users, POST /users         - Accounts (ADMIN only)
//! POST /users/{id}/delete
//! GET  /donors, POST /donors       - List / create
//! GET  /donors/{id}, POST /donors/{id}
//! POST /donors/{id}/delete
//!      (same for /recipients and /items)
//! GET  /donations, POST /donations
//! GET  /donations/new              - Donation wizard
//! GET  /donations/{id}
//! POST /donations/{id}/delete
//!
//! # JSON API (bearer token or session), see [`api`]
//!
//! # Files
//! GET  /media/*                    - Uploaded photos
//! GET  /static/*                   - Stylesheet and scripts
//! ```
//!
//! Trailing slashes are trimmed before routing, so `/api/doadores/` and
//! `/api/doadores` are the same route.

pub mod api;
pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod donations;
pub mod items;
pub mod payload;
pub mod users;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower::Layer;
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::Span;

use crate::db::{DonorTable, RecipientTable};
use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::services::media::MAX_PHOTO_BYTES;
use crate::state::AppState;

use self::contacts::ContactSection;

/// Directory of the stylesheet and scripts.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Request body limit: one photo plus the form fields around it.
const MAX_BODY_BYTES: usize = MAX_PHOTO_BYTES + 1024 * 1024;

/// Page routes for one contact table.
fn contact_pages<T: ContactSection>() -> Router<AppState> {
    let base = T::SECTION.path;
    Router::new()
        .route(base, get(contacts::index::<T>).post(contacts::create::<T>))
        .route(
            &format!("{base}/{{id}}"),
            get(contacts::show::<T>).post(contacts::update::<T>),
        )
        .route(&format!("{base}/{{id}}/delete"), post(contacts::delete::<T>))
}

/// Server-rendered pages.
pub fn pages() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::root))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/users", get(users::index).post(users::create))
        .route("/users/{id}/delete", post(users::delete))
        .merge(contact_pages::<DonorTable>())
        .merge(contact_pages::<RecipientTable>())
        .route("/items", get(items::index).post(items::create))
        .route("/items/{id}", get(items::show).post(items::update))
        .route("/items/{id}/delete", post(items::delete))
        .route("/donations", get(donations::index).post(donations::create))
        .route("/donations/new", get(donations::wizard))
        .route("/donations/{id}", get(donations::show))
        .route("/donations/{id}/delete", post(donations::delete))
}

/// Build the complete application: routes, files and middleware.
pub fn app(state: AppState, session_layer: SessionManagerLayer<PostgresStore>) -> NormalizePath<Router> {
    let media = ServeDir::new(&state.config().media_dir);

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(pages())
        .merge(api::router())
        .nest_service("/media", media)
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::test_config;
    use crate::middleware::create_session_layer;

    /// The app over a pool that never connects; only routes that stay off
    /// the database can be exercised.
    fn test_app() -> NormalizePath<Router> {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/doacoes_test")
            .unwrap();
        let session_layer = create_session_layer(&pool, &config).unwrap();
        app(AppState::new(config, pool), session_layer)
    }

    async fn get(uri: &str) -> axum::response::Response {
        test_app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_api_requires_credentials() {
        for uri in ["/api/doadores", "/api/doadores/", "/api/doacoes", "/api/users/me"] {
            let response = get(uri).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_pages_redirect_to_login() {
        for uri in ["/", "/dashboard", "/donors", "/items/", "/donations/new"] {
            let response = get(uri).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let response = get("/health").await;
        assert!(
            response
                .headers()
                .contains_key(header::X_CONTENT_TYPE_OPTIONS)
        );
    }
}
