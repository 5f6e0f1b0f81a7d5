//! Donor and recipient pages.
//!
//! Both sections share handlers and templates; [`ContactSection`] supplies
//! the paths and titles.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use doacoes_core::{ContactDraft, ValidationErrors};

use crate::db::{
    ContactRepository, ContactTable, DonationFilter, DonationRepository, DonorTable,
    RecipientTable,
};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Page, require};
use crate::models::{Contact, CurrentUser, DonationSummary};
use crate::routes::payload::Payload;
use crate::state::AppState;

/// Page metadata of a contact table.
pub trait ContactSection: ContactTable {
    const SECTION: Section;

    /// Donations in which a row of this table took part.
    fn donations_of(id: Self::Id) -> DonationFilter;
}

/// Names used by the templates.
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub path: &'static str,
    pub title: &'static str,
    pub singular: &'static str,
}

impl ContactSection for DonorTable {
    const SECTION: Section = Section {
        path: "/donors",
        title: "Donors",
        singular: "donor",
    };

    fn donations_of(id: Self::Id) -> DonationFilter {
        DonationFilter::Donor(id)
    }
}

impl ContactSection for RecipientTable {
    const SECTION: Section = Section {
        path: "/recipients",
        title: "Recipients",
        singular: "recipient",
    };

    fn donations_of(id: Self::Id) -> DonationFilter {
        DonationFilter::Recipient(id)
    }
}

// =============================================================================
// View Types
// =============================================================================

/// Form field values, echoed back when validation fails.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub notes: String,
}

impl From<&ContactDraft> for ContactForm {
    fn from(draft: &ContactDraft) -> Self {
        Self {
            name: draft.name.clone().unwrap_or_default(),
            email: draft.email.clone().unwrap_or_default(),
            phone: draft.phone.clone().unwrap_or_default(),
            address: draft.address.clone().unwrap_or_default(),
            notes: draft.notes.clone().unwrap_or_default(),
        }
    }
}

/// A row as displayed.
#[derive(Debug, Clone)]
pub struct ContactView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub notes: String,
    pub created_at: String,
}

impl<Id: Copy + Into<i32>> From<&Contact<Id>> for ContactView {
    fn from(contact: &Contact<Id>) -> Self {
        Self {
            id: contact.id.into(),
            name: contact.name.clone(),
            email: contact
                .email
                .as_ref()
                .map(|e| e.as_str().to_owned())
                .unwrap_or_default(),
            phone: contact.phone.clone().unwrap_or_default(),
            address: contact.address.clone().unwrap_or_default(),
            notes: contact.notes.clone(),
            created_at: contact.created_at.format("%d/%m/%Y").to_string(),
        }
    }
}

impl From<&ContactView> for ContactForm {
    fn from(view: &ContactView) -> Self {
        Self {
            name: view.name.clone(),
            email: view.email.clone(),
            phone: view.phone.clone(),
            address: view.address.clone(),
            notes: view.notes.clone(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "contacts/index.html")]
pub struct ContactsTemplate {
    pub user: CurrentUser,
    pub section: Section,
    pub contacts: Vec<ContactView>,
    pub form: ContactForm,
    pub errors: ValidationErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "contacts/show.html")]
pub struct ContactTemplate {
    pub user: CurrentUser,
    pub section: Section,
    pub contact: ContactView,
    pub form: ContactForm,
    pub errors: ValidationErrors,
    pub donations: Vec<DonationSummary>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn render_index<T: ContactSection>(
    state: &AppState,
    user: CurrentUser,
    form: ContactForm,
    errors: ValidationErrors,
) -> Result<ContactsTemplate, AppError> {
    let contacts = ContactRepository::<T>::new(state.pool()).list_all().await?;

    Ok(ContactsTemplate {
        user,
        section: T::SECTION,
        contacts: contacts.iter().map(ContactView::from).collect(),
        form,
        errors,
    })
}

async fn render_show<T: ContactSection>(
    state: &AppState,
    user: CurrentUser,
    id: T::Id,
    form: Option<ContactForm>,
    errors: ValidationErrors,
) -> Result<ContactTemplate, AppError> {
    let contact = ContactRepository::<T>::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id} not found", T::NOUN)))?;
    let donations = DonationRepository::new(state.pool())
        .list(T::donations_of(id))
        .await?;

    let contact = ContactView::from(&contact);
    Ok(ContactTemplate {
        user,
        section: T::SECTION,
        form: form.unwrap_or_else(|| ContactForm::from(&contact)),
        contact,
        errors,
        donations,
    })
}

/// List page with the creation form.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn index<T: ContactSection>(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
) -> Result<ContactsTemplate, AppError> {
    render_index::<T>(&state, page.user, ContactForm::default(), ValidationErrors::new()).await
}

/// Create from the list page's form.
///
/// # Errors
///
/// Returns an error if the database query fails.
#[tracing::instrument(skip_all, fields(table = T::TABLE))]
pub async fn create<T: ContactSection>(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Response, AppError> {
    let draft: ContactDraft = payload.parse()?;

    match draft.validate() {
        Ok(details) => {
            let contact = ContactRepository::<T>::new(state.pool())
                .create(&details)
                .await?;
            tracing::info!(id = %contact.id, "contact created");
            Ok(Redirect::to(&format!("{}/{}", T::SECTION.path, contact.id)).into_response())
        }
        Err(errors) => {
            let template =
                render_index::<T>(&state, page.user, ContactForm::from(&draft), errors).await?;
            Ok((StatusCode::BAD_REQUEST, template).into_response())
        }
    }
}

/// Detail page with the edit form and related donations.
///
/// # Errors
///
/// Returns 404 if the row does not exist.
pub async fn show<T: ContactSection>(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<T::Id>,
) -> Result<ContactTemplate, AppError> {
    render_show::<T>(&state, page.user, id, None, ValidationErrors::new()).await
}

/// Save the edit form.
///
/// # Errors
///
/// Returns 404 if the row does not exist.
#[tracing::instrument(skip_all, fields(table = T::TABLE, id = %id))]
pub async fn update<T: ContactSection>(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<T::Id>,
    payload: Payload,
) -> Result<Response, AppError> {
    let draft: ContactDraft = payload.parse()?;

    match draft.validate() {
        Ok(details) => {
            ContactRepository::<T>::new(state.pool())
                .update(id, &details)
                .await?;
            Ok(Redirect::to(&format!("{}/{id}", T::SECTION.path)).into_response())
        }
        Err(errors) => {
            let template = render_show::<T>(
                &state,
                page.user,
                id,
                Some(ContactForm::from(&draft)),
                errors,
            )
            .await?;
            Ok((StatusCode::BAD_REQUEST, template).into_response())
        }
    }
}

/// Delete and return to the list.
///
/// # Errors
///
/// Returns 404 if the row does not exist.
#[tracing::instrument(skip_all, fields(table = T::TABLE, id = %id))]
pub async fn delete<T: ContactSection>(
    _page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<T::Id>,
) -> Result<Redirect, AppError> {
    ContactRepository::<T>::new(state.pool())
        .delete(id)
        .await?;

    tracing::info!("contact deleted");
    Ok(Redirect::to(T::SECTION.path))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use doacoes_core::{DonorId, Email};

    use super::*;

    #[test]
    fn test_view_and_form_from_contact() {
        let contact = Contact {
            id: DonorId::new(4),
            name: "Maria".to_string(),
            email: Some(Email::parse("maria@ong.org").unwrap()),
            phone: None,
            address: Some("Rua A, 1".to_string()),
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = ContactView::from(&contact);
        assert_eq!(view.id, 4);
        assert_eq!(view.email, "maria@ong.org");
        assert_eq!(view.phone, "");

        let form = ContactForm::from(&view);
        assert_eq!(form.address, "Rua A, 1");
    }

    #[test]
    fn test_sections() {
        assert_eq!(DonorTable::SECTION.path, "/donors");
        assert_eq!(RecipientTable::SECTION.path, "/recipients");
        assert_eq!(
            DonorTable::donations_of(DonorId::new(1)),
            DonationFilter::Donor(DonorId::new(1))
        );
    }
}
