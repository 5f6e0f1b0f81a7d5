//! Dashboard page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::{
    db::{self, Counts, DonationFilter, DonationRepository},
    error::AppError,
    filters,
    middleware::{Page, require},
    models::{CurrentUser, DonationSummary},
    state::AppState,
};

/// Donations shown under the counters.
const RECENT_DONATIONS: usize = 5;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: CurrentUser,
    pub counts: Counts,
    pub recent: Vec<DonationSummary>,
}

/// Dashboard page handler.
///
/// # Errors
///
/// Returns an error if a database query fails.
#[instrument(skip_all, fields(user_id = %page.user.id))]
pub async fn dashboard(
    page: Page<require::ViewDashboard>,
    State(state): State<AppState>,
) -> Result<DashboardTemplate, AppError> {
    let repo = DonationRepository::new(state.pool());
    let (counts, donations) = tokio::join!(
        db::counts(state.pool()),
        repo.list(DonationFilter::All),
    );

    let mut recent = donations?;
    recent.truncate(RECENT_DONATIONS);

    Ok(DashboardTemplate {
        user: page.user,
        counts: counts?,
        recent,
    })
}
