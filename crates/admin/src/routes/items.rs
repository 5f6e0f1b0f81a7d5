//! Item pages. The list also shows cash donations.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use doacoes_core::{ItemCategory, ItemDraft, ItemId, ValidationErrors};

use crate::db::{DonationFilter, DonationRepository, DonorRepository, ItemRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Page, require};
use crate::models::{CurrentUser, DonationSummary, Donor, Item};
use crate::routes::payload::Payload;
use crate::services::PhotoUpload;
use crate::state::AppState;

/// Form field values, echoed back when validation fails.
#[derive(Debug, Clone)]
pub struct ItemForm {
    pub name: String,
    pub category: String,
    pub description: String,
    pub available: bool,
    pub donor: String,
}

impl Default for ItemForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: String::new(),
            description: String::new(),
            available: true,
            donor: String::new(),
        }
    }
}

impl From<&ItemDraft> for ItemForm {
    fn from(draft: &ItemDraft) -> Self {
        Self {
            name: draft.name.clone().unwrap_or_default(),
            category: draft.category.clone().unwrap_or_default(),
            description: draft.description.clone().unwrap_or_default(),
            available: draft.available.unwrap_or(true),
            donor: draft.donor.clone().unwrap_or_default(),
        }
    }
}

impl From<&Item> for ItemForm {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            category: item.category.code().to_owned(),
            description: item.description.clone(),
            available: item.available,
            donor: item.donor.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "items/index.html")]
pub struct ItemsTemplate {
    pub user: CurrentUser,
    pub items: Vec<Item>,
    pub money: Vec<DonationSummary>,
    pub donors: Vec<Donor>,
    pub categories: &'static [ItemCategory],
    pub form: ItemForm,
    pub errors: ValidationErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "items/show.html")]
pub struct ItemTemplate {
    pub user: CurrentUser,
    pub item: Item,
    pub donations: Vec<DonationSummary>,
    pub donors: Vec<Donor>,
    pub categories: &'static [ItemCategory],
    pub form: ItemForm,
    pub errors: ValidationErrors,
}

async fn render_index(
    state: &AppState,
    user: CurrentUser,
    form: ItemForm,
    errors: ValidationErrors,
) -> Result<ItemsTemplate, AppError> {
    let items = ItemRepository::new(state.pool()).list_all().await?;
    let money = DonationRepository::new(state.pool())
        .list(DonationFilter::Money)
        .await?;
    let donors = DonorRepository::new(state.pool()).list_all().await?;

    Ok(ItemsTemplate {
        user,
        items,
        money,
        donors,
        categories: ItemCategory::ALL,
        form,
        errors,
    })
}

async fn render_show(
    state: &AppState,
    user: CurrentUser,
    id: ItemId,
    form: Option<ItemForm>,
    errors: ValidationErrors,
) -> Result<ItemTemplate, AppError> {
    let item = ItemRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("item {id} not found")))?;
    let donations = DonationRepository::new(state.pool())
        .list(DonationFilter::Item(id))
        .await?;
    let donors = DonorRepository::new(state.pool()).list_all().await?;

    Ok(ItemTemplate {
        user,
        form: form.unwrap_or_else(|| ItemForm::from(&item)),
        item,
        donations,
        donors,
        categories: ItemCategory::ALL,
        errors,
    })
}

/// Check a posted photo before anything is written.
fn check_photo(photo: Option<&PhotoUpload>, errors: &mut ValidationErrors) {
    if let Some(Err(e)) = photo.map(PhotoUpload::validate) {
        errors.add("photo", e.to_string());
    }
}

/// List page with the creation form.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub async fn index(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
) -> Result<ItemsTemplate, AppError> {
    render_index(&state, page.user, ItemForm::default(), ValidationErrors::new()).await
}

/// Create from the list page's form.
///
/// # Errors
///
/// Returns an error if the photo cannot be stored or a query fails.
#[tracing::instrument(skip_all)]
pub async fn create(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    mut payload: Payload,
) -> Result<Response, AppError> {
    let draft: ItemDraft = payload.parse()?;
    let upload = payload.take_photo();

    let mut errors = ValidationErrors::new();
    check_photo(upload.as_ref(), &mut errors);
    let details = draft.validate().map_err(|e| errors.extend(e)).ok();

    let Some(details) = details.filter(|_| errors.is_empty()) else {
        let template = render_index(&state, page.user, ItemForm::from(&draft), errors).await?;
        return Ok((StatusCode::BAD_REQUEST, template).into_response());
    };

    let photo = match &upload {
        Some(upload) => Some(state.media().save(upload).await?),
        None => None,
    };

    match ItemRepository::new(state.pool())
        .create(&details, photo.as_deref())
        .await
    {
        Ok(item) => {
            tracing::info!(item_id = %item.id, "item created");
            Ok(Redirect::to(&format!("/items/{}", item.id)).into_response())
        }
        Err(e) => {
            if let Some(path) = &photo {
                state.media().remove(path).await;
            }
            Err(e.into())
        }
    }
}

/// Detail page with the edit form and the item's donations.
///
/// # Errors
///
/// Returns 404 if the item does not exist.
pub async fn show(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<ItemTemplate, AppError> {
    render_show(&state, page.user, id, None, ValidationErrors::new()).await
}

/// Save the edit form. A new photo replaces the old one.
///
/// # Errors
///
/// Returns 404 if the item does not exist.
#[tracing::instrument(skip_all, fields(item_id = %id))]
pub async fn update(
    page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    mut payload: Payload,
) -> Result<Response, AppError> {
    let draft: ItemDraft = payload.parse()?;
    let upload = payload.take_photo();

    let mut errors = ValidationErrors::new();
    check_photo(upload.as_ref(), &mut errors);
    let details = draft.validate().map_err(|e| errors.extend(e)).ok();

    let Some(details) = details.filter(|_| errors.is_empty()) else {
        let template =
            render_show(&state, page.user, id, Some(ItemForm::from(&draft)), errors).await?;
        return Ok((StatusCode::BAD_REQUEST, template).into_response());
    };

    let photo = match &upload {
        Some(upload) => Some(state.media().save(upload).await?),
        None => None,
    };

    match ItemRepository::new(state.pool())
        .update(id, &details, photo.as_deref())
        .await
    {
        Ok((_, replaced)) => {
            if let Some(old) = replaced {
                state.media().remove(&old).await;
            }
            Ok(Redirect::to(&format!("/items/{id}")).into_response())
        }
        Err(e) => {
            if let Some(path) = &photo {
                state.media().remove(path).await;
            }
            Err(e.into())
        }
    }
}

/// Delete and return to the list.
///
/// # Errors
///
/// Returns 404 if the item does not exist.
#[tracing::instrument(skip_all, fields(item_id = %id))]
pub async fn delete(
    _page: Page<require::ManageRecords>,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<Redirect, AppError> {
    if let Some(photo) = ItemRepository::new(state.pool()).delete(id).await? {
        state.media().remove(&photo).await;
    }

    tracing::info!("item deleted");
    Ok(Redirect::to("/items"))
}
