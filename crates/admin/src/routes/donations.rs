//! Donation pages and the wizard page.
//!
//! The wizard page is a plain form enhanced by `static/wizard.js`, which
//! posts it to `/api/wizard/doacoes` as multipart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use doacoes_core::{DonationDraft, DonationId, ItemCategory, ValidationErrors};

use crate::db::{
    DonationFilter, DonationRepository, DonorRepository, ItemRepository, RecipientRepository,
};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Page, require};
use crate::models::{CurrentUser, DonationSummary, Donor, Item, Recipient};
use crate::routes::payload::Payload;
use crate::state::AppState;

/// Form field values, echoed back when validation fails.
#[derive(Debug, Clone, Default)]
pub struct DonationForm {
    pub donor: String,
    pub recipient: String,
    pub item: String,
    pub amount: String,
    pub notes: String,
}

impl From<&DonationDraft> for DonationForm {
    fn from(draft: &DonationDraft) -> Self {
        Self {
            donor: draft.donor.clone().unwrap_or_default(),
            recipient: draft.recipient.clone().unwrap_or_default(),
            item: draft.item.clone().unwrap_or_default(),
            amount: draft.amount.clone().unwrap_or_default(),
            notes: draft.notes.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "donations/index.html")]
pub struct DonationsTemplate {
    pub user: CurrentUser,
    pub donations: Vec<DonationSummary>,
    pub donors: Vec<Donor>,
    pub recipients: Vec<Recipient>,
    pub items: Vec<Item>,
    pub form: DonationForm,
    pub errors: ValidationErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "donations/show.html")]
pub struct DonationTemplate {
    pub user: CurrentUser,
    pub donation: DonationSummary,
}

#[derive(Template, WebTemplate)]
#[template(path = "donations/new.html")]
pub struct WizardTemplate {
    pub user: CurrentUser,
    pub donors: Vec<Donor>,
    pub recipients: Vec<Recipient>,
    pub categories: &'static [ItemCategory],
}

async fn render_index(
    state: &AppState,
    user: CurrentUser,
    form: DonationForm,
    errors: ValidationErrors,
) -> Result<DonationsTemplate, AppError> {
    let donations = DonationRepository::new(state.pool())
        .list(DonationFilter::All)
        .await?;
    let donors = DonorRepository::new(state.pool()).list_all().await?;
    let recipients = RecipientRepository::new(state.pool()).list_all().await?;
    let items = ItemRepository::new(state.pool()).list_available().await?;

    Ok(DonationsTemplate {
        user,
        donations,
        donors,
        recipients,
        items,
        form,
        errors,
    })
}

/// List page with a form for donating an existing item or money.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub async fn index(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
) -> Result<DonationsTemplate, AppError> {
    render_index(&state, page.user, DonationForm::default(), ValidationErrors::new()).await
}

/// Create from the list page's form.
///
/// # Errors
///
/// Returns an error if the database query fails.
#[tracing::instrument(skip_all)]
pub async fn create(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Response, AppError> {
    let draft: DonationDraft = payload.parse()?;

    let errors = match draft.validate() {
        Ok(details) => match DonationRepository::new(state.pool()).create(&details).await {
            Ok(donation) => {
                tracing::info!(donation_id = %donation.id, "donation created");
                return Ok(Redirect::to(&format!("/donations/{}", donation.id)).into_response());
            }
            Err(e) => match AppError::from(e) {
                AppError::Validation(errors) => errors,
                other => return Err(other),
            },
        },
        Err(errors) => errors,
    };

    let template = render_index(&state, page.user, DonationForm::from(&draft), errors).await?;
    Ok((StatusCode::BAD_REQUEST, template).into_response())
}

/// Detail page.
///
/// # Errors
///
/// Returns 404 if the donation does not exist.
pub async fn show(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<DonationId>,
) -> Result<DonationTemplate, AppError> {
    let donation = DonationRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("donation {id} not found")))?;

    Ok(DonationTemplate {
        user: page.user,
        donation,
    })
}

/// Delete and return to the list.
///
/// # Errors
///
/// Returns 404 if the donation does not exist.
#[tracing::instrument(skip_all, fields(donation_id = %id))]
pub async fn delete(
    _page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<DonationId>,
) -> Result<Redirect, AppError> {
    DonationRepository::new(state.pool()).delete(id).await?;

    tracing::info!("donation deleted");
    Ok(Redirect::to("/donations"))
}

/// The donation wizard.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub async fn wizard(
    page: Page<require::RegisterDonations>,
    State(state): State<AppState>,
) -> Result<WizardTemplate, AppError> {
    let donors = DonorRepository::new(state.pool()).list_all().await?;
    let recipients = RecipientRepository::new(state.pool()).list_all().await?;

    Ok(WizardTemplate {
        user: page.user,
        donors,
        recipients,
        categories: ItemCategory::ALL,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_echoes_draft() {
        let draft = DonationDraft {
            donor: Some("3".to_string()),
            amount: Some("10,50".to_string()),
            ..DonationDraft::default()
        };
        let form = DonationForm::from(&draft);
        assert_eq!(form.donor, "3");
        assert_eq!(form.amount, "10,50");
        assert!(form.item.is_empty());
    }
}
