//! Donation wizard: donor, recipient and donation in one step.
//!
//! The input is checked in full by [`WizardInput::plan`] before anything is
//! written. [`WizardService::run`] then stores the photo (if any) and performs
//! every insert inside a single transaction. A failed transaction removes the
//! stored photo again.

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use doacoes_core::validation::lenient;
use doacoes_core::{
    ContactDetails, ContactDraft, DonationDetails, DonationTarget, DonorId, ItemDetails,
    ItemDraft, MonetaryAmount, RecipientId, ValidationErrors,
};

use super::media::{MediaError, MediaStore, PhotoUpload};
use crate::db::{DonationRepository, DonorRepository, ItemRepository, RecipientRepository, RepositoryError};
use crate::error::AppError;
use crate::models::Donation;

// =============================================================================
// Input
// =============================================================================

/// Flat wizard payload, from JSON or from the text fields of a multipart form.
///
/// Every field also accepts its Portuguese name (`tipo_doacao`, `doador_nome`,
/// `valor`, ...) as posted by older clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WizardInput {
    #[serde(default, alias = "tipo_doacao", deserialize_with = "lenient::text")]
    pub kind: Option<String>,

    #[serde(default, alias = "doador_tipo", deserialize_with = "lenient::text")]
    pub donor_mode: Option<String>,
    #[serde(default, alias = "doador_id", deserialize_with = "lenient::text")]
    pub donor_id: Option<String>,
    #[serde(default, alias = "doador_nome", deserialize_with = "lenient::text")]
    pub donor_name: Option<String>,
    #[serde(default, alias = "doador_email", deserialize_with = "lenient::text")]
    pub donor_email: Option<String>,
    #[serde(default, alias = "doador_telefone", deserialize_with = "lenient::text")]
    pub donor_phone: Option<String>,
    #[serde(default, alias = "doador_endereco", deserialize_with = "lenient::text")]
    pub donor_address: Option<String>,

    #[serde(default, alias = "recebedor_tipo", deserialize_with = "lenient::text")]
    pub recipient_mode: Option<String>,
    #[serde(default, alias = "recebedor_id", deserialize_with = "lenient::text")]
    pub recipient_id: Option<String>,
    #[serde(default, alias = "recebedor_nome", deserialize_with = "lenient::text")]
    pub recipient_name: Option<String>,
    #[serde(default, alias = "recebedor_email", deserialize_with = "lenient::text")]
    pub recipient_email: Option<String>,
    #[serde(default, alias = "recebedor_telefone", deserialize_with = "lenient::text")]
    pub recipient_phone: Option<String>,
    #[serde(default, alias = "recebedor_endereco", deserialize_with = "lenient::text")]
    pub recipient_address: Option<String>,

    #[serde(default, alias = "valor", deserialize_with = "lenient::text")]
    pub amount: Option<String>,
    #[serde(default, alias = "item_nome", deserialize_with = "lenient::text")]
    pub item_name: Option<String>,
    #[serde(default, alias = "item_tipo", deserialize_with = "lenient::text")]
    pub item_category: Option<String>,
    #[serde(default, alias = "item_descricao", deserialize_with = "lenient::text")]
    pub item_description: Option<String>,

    #[serde(default, alias = "observacoes", deserialize_with = "lenient::text")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Money,
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Existing,
    New,
}

fn parse_kind(raw: &str) -> Option<Kind> {
    match raw.to_ascii_lowercase().as_str() {
        "money" | "dinheiro" => Some(Kind::Money),
        "item" => Some(Kind::Item),
        _ => None,
    }
}

fn parse_mode(raw: &str) -> Option<Mode> {
    match raw.to_ascii_lowercase().as_str() {
        "existing" | "existente" => Some(Mode::Existing),
        "new" | "novo" => Some(Mode::New),
        _ => None,
    }
}

// =============================================================================
// Plan
// =============================================================================

/// Where a party of the donation comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Party<Id> {
    Existing(Id),
    New(ContactDetails),
}

/// What is being donated.
#[derive(Debug, Clone)]
pub enum Gift {
    Money(MonetaryAmount),
    Item {
        details: ItemDetails,
        photo: Option<PhotoUpload>,
    },
}

/// A fully validated wizard request, ready to execute.
#[derive(Debug, Clone)]
pub struct WizardPlan {
    pub donor: Party<DonorId>,
    pub recipient: Option<Party<RecipientId>>,
    pub gift: Gift,
    pub notes: String,
}

impl WizardInput {
    /// Validate the whole request.
    ///
    /// # Errors
    ///
    /// Returns every failure found. Field names match the input fields.
    pub fn plan(&self, photo: Option<PhotoUpload>) -> Result<WizardPlan, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let donor = self.plan_donor(&mut errors);
        let recipient = self.plan_recipient(&mut errors);
        let gift = self.plan_gift(&mut errors, photo);

        match (donor, gift) {
            (Some(donor), Some(gift)) if errors.is_empty() => Ok(WizardPlan {
                donor,
                recipient,
                gift,
                notes: self.notes.clone().unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }

    fn plan_donor(&self, errors: &mut ValidationErrors) -> Option<Party<DonorId>> {
        let Some(raw) = self.donor_mode.as_deref() else {
            errors.add("donor_mode", "this field is required");
            return None;
        };

        match parse_mode(raw) {
            Some(Mode::Existing) => match self.donor_id.as_deref().map(str::parse::<DonorId>) {
                Some(Ok(id)) => Some(Party::Existing(id)),
                Some(Err(_)) => {
                    errors.add("donor_id", "not a valid id");
                    None
                }
                None => {
                    errors.add("donor_id", "this field is required");
                    None
                }
            },
            Some(Mode::New) => {
                let draft = ContactDraft {
                    name: self.donor_name.clone(),
                    email: self.donor_email.clone(),
                    phone: self.donor_phone.clone(),
                    address: self.donor_address.clone(),
                    notes: None,
                };
                draft
                    .validate()
                    .map_err(|e| errors.extend(e.scoped("donor")))
                    .ok()
                    .map(Party::New)
            }
            None => {
                errors.add("donor_mode", format!("\"{raw}\" is not a valid choice"));
                None
            }
        }
    }

    fn plan_recipient(&self, errors: &mut ValidationErrors) -> Option<Party<RecipientId>> {
        let raw = self.recipient_mode.as_deref()?;

        match parse_mode(raw) {
            Some(Mode::Existing) => match self.recipient_id.as_deref()?.parse::<RecipientId>() {
                Ok(id) => Some(Party::Existing(id)),
                Err(_) => {
                    errors.add("recipient_id", "not a valid id");
                    None
                }
            },
            Some(Mode::New) => {
                self.recipient_name.as_ref()?;
                let draft = ContactDraft {
                    name: self.recipient_name.clone(),
                    email: self.recipient_email.clone(),
                    phone: self.recipient_phone.clone(),
                    address: self.recipient_address.clone(),
                    notes: None,
                };
                draft
                    .validate()
                    .map_err(|e| errors.extend(e.scoped("recipient")))
                    .ok()
                    .map(Party::New)
            }
            None => {
                errors.add("recipient_mode", format!("\"{raw}\" is not a valid choice"));
                None
            }
        }
    }

    fn plan_gift(&self, errors: &mut ValidationErrors, photo: Option<PhotoUpload>) -> Option<Gift> {
        let Some(raw) = self.kind.as_deref() else {
            errors.add("kind", "this field is required");
            return None;
        };

        match parse_kind(raw) {
            Some(Kind::Money) => {
                let Some(amount) = self.amount.as_deref() else {
                    errors.add("amount", "this field is required");
                    return None;
                };
                MonetaryAmount::parse(amount)
                    .map_err(|e| errors.add("amount", e.to_string()))
                    .ok()
                    .map(Gift::Money)
            }
            Some(Kind::Item) => {
                if let Some(Err(e)) = photo.as_ref().map(PhotoUpload::validate) {
                    errors.add("item_photo", e.to_string());
                }
                let draft = ItemDraft {
                    name: self.item_name.clone(),
                    category: self.item_category.clone(),
                    description: self.item_description.clone(),
                    available: None,
                    donor: None,
                };
                draft
                    .validate()
                    .map_err(|e| errors.extend(e.scoped("item")))
                    .ok()
                    .map(|details| Gift::Item { details, photo })
            }
            None => {
                errors.add("kind", format!("\"{raw}\" is not a valid choice"));
                None
            }
        }
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Errors raised while executing a validated plan.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("donor {0} not found")]
    DonorNotFound(DonorId),

    #[error("recipient {0} not found")]
    RecipientNotFound(RecipientId),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for WizardError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::DonorNotFound(_) | WizardError::RecipientNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            WizardError::Media(e) => e.into(),
            WizardError::Repository(e) => e.into(),
        }
    }
}

/// Executes wizard plans.
pub struct WizardService<'a> {
    pool: &'a PgPool,
    media: &'a MediaStore,
}

impl<'a> WizardService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, media: &'a MediaStore) -> Self {
        Self { pool, media }
    }

    /// Store the photo and write every row of the plan in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::DonorNotFound`/`RecipientNotFound` when an
    /// existing party is missing. Nothing is written on any error.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, plan: &WizardPlan) -> Result<Donation, WizardError> {
        let photo = match &plan.gift {
            Gift::Item {
                photo: Some(upload),
                ..
            } => Some(self.media.save(upload).await?),
            _ => None,
        };

        match self.execute(plan, photo.as_deref()).await {
            Ok(donation) => {
                tracing::info!(
                    donation_id = %donation.id,
                    donor_id = %donation.donor,
                    money = donation.is_money(),
                    "wizard donation registered"
                );
                Ok(donation)
            }
            Err(e) => {
                if let Some(path) = &photo {
                    self.media.remove(path).await;
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, plan: &WizardPlan, photo: Option<&str>) -> Result<Donation, WizardError> {
        let mut tx = self.pool.begin().await?;

        let donor = match &plan.donor {
            Party::Existing(id) => {
                DonorRepository::find(&mut *tx, *id)
                    .await?
                    .ok_or(WizardError::DonorNotFound(*id))?
                    .id
            }
            Party::New(details) => DonorRepository::insert(&mut *tx, details).await?.id,
        };

        let recipient = match &plan.recipient {
            Some(Party::Existing(id)) => Some(
                RecipientRepository::find(&mut *tx, *id)
                    .await?
                    .ok_or(WizardError::RecipientNotFound(*id))?
                    .id,
            ),
            Some(Party::New(details)) => Some(RecipientRepository::insert(&mut *tx, details).await?.id),
            None => None,
        };

        let target = match &plan.gift {
            Gift::Money(amount) => DonationTarget::Money(*amount),
            Gift::Item { details, .. } => {
                let details = ItemDetails {
                    available: recipient.is_none(),
                    donor: Some(donor),
                    ..details.clone()
                };
                let item = ItemRepository::insert(&mut *tx, &details, photo).await?;
                DonationTarget::Item(item.id)
            }
        };

        let donation = DonationRepository::insert(
            &mut *tx,
            &DonationDetails {
                donor,
                recipient,
                target,
                notes: plan.notes.clone(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(donation)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;

    use super::*;
    use doacoes_core::ItemCategory;

    fn money(amount: &str) -> WizardInput {
        WizardInput {
            kind: Some("money".into()),
            donor_mode: Some("existing".into()),
            donor_id: Some("1".into()),
            amount: Some(amount.into()),
            ..WizardInput::default()
        }
    }

    fn item() -> WizardInput {
        WizardInput {
            kind: Some("item".into()),
            donor_mode: Some("new".into()),
            donor_name: Some("Carlos".into()),
            donor_phone: Some("11 98888-7777".into()),
            item_name: Some("Cadeira".into()),
            item_category: Some("MO".into()),
            ..WizardInput::default()
        }
    }

    #[test]
    fn test_money_plan() {
        let plan = money("150,50").plan(None).unwrap();
        assert_eq!(plan.donor, Party::Existing(DonorId::new(1)));
        assert!(plan.recipient.is_none());
        match plan.gift {
            Gift::Money(amount) => assert_eq!(amount.to_string(), "150.50"),
            Gift::Item { .. } => panic!("expected money"),
        }
    }

    #[test]
    fn test_zero_amount_rejected() {
        let errors = money("0").plan(None).unwrap_err();
        assert!(errors.has("amount"));
    }

    #[test]
    fn test_portuguese_field_names() {
        let input: WizardInput = serde_json::from_value(serde_json::json!({
            "tipo_doacao": "dinheiro",
            "doador_tipo": "novo",
            "doador_nome": "Ana",
            "doador_telefone": "11 97777-6666",
            "recebedor_tipo": "existente",
            "recebedor_id": 4,
            "valor": "80,00",
            "observacoes": "entregue na sede",
        }))
        .unwrap();

        let plan = input.plan(None).unwrap();
        match &plan.donor {
            Party::New(details) => assert_eq!(details.name, "Ana"),
            Party::Existing(_) => panic!("expected new donor"),
        }
        assert_eq!(plan.recipient, Some(Party::Existing(RecipientId::new(4))));
        assert!(matches!(plan.gift, Gift::Money(amount) if amount.to_string() == "80.00"));
        assert_eq!(plan.notes, "entregue na sede");
    }

    #[test]
    fn test_missing_amount_rejected() {
        let mut input = money("1");
        input.amount = None;
        assert!(input.plan(None).unwrap_err().has("amount"));
    }

    #[test]
    fn test_item_plan() {
        let plan = item().plan(None).unwrap();
        match &plan.donor {
            Party::New(details) => assert_eq!(details.name, "Carlos"),
            Party::Existing(_) => panic!("expected new donor"),
        }
        match plan.gift {
            Gift::Item { details, photo } => {
                assert_eq!(details.category, ItemCategory::Moveis);
                assert!(photo.is_none());
            }
            Gift::Money(_) => panic!("expected item"),
        }
    }

    #[test]
    fn test_errors_are_scoped_to_input_fields() {
        let mut input = item();
        input.donor_phone = None;
        input.item_category = Some("ZZ".into());
        let errors = input.plan(None).unwrap_err();
        assert!(errors.has("item_category"));
        assert!(errors.has(doacoes_core::validation::NON_FIELD_ERRORS));
    }

    #[test]
    fn test_recipient_leniency() {
        let mut input = item();
        input.recipient_mode = Some("existing".into());
        assert!(input.plan(None).unwrap().recipient.is_none());

        input.recipient_mode = Some("new".into());
        assert!(input.plan(None).unwrap().recipient.is_none());

        input.recipient_name = Some("Abrigo Esperança".into());
        input.recipient_email = Some("contato@abrigo.org".into());
        assert!(matches!(input.plan(None).unwrap().recipient, Some(Party::New(_))));
    }

    #[test]
    fn test_new_recipient_still_validated() {
        let mut input = item();
        input.recipient_mode = Some("novo".into());
        input.recipient_name = Some("Abrigo".into());
        let errors = input.plan(None).unwrap_err();
        assert!(errors.has(doacoes_core::validation::NON_FIELD_ERRORS));
    }

    #[test]
    fn test_portuguese_choices() {
        let mut input = money("10");
        input.kind = Some("dinheiro".into());
        input.donor_mode = Some("existente".into());
        assert!(input.plan(None).is_ok());
    }

    #[test]
    fn test_unknown_choices() {
        let mut input = money("10");
        input.kind = Some("crypto".into());
        input.donor_mode = Some("maybe".into());
        let errors = input.plan(None).unwrap_err();
        assert!(errors.has("kind"));
        assert!(errors.has("donor_mode"));
    }

    #[test]
    fn test_photo_checked_before_writing() {
        let photo = PhotoUpload {
            content_type: Some("text/plain".into()),
            file_name: Some("notes.txt".into()),
            bytes: Bytes::from_static(b"hello"),
        };
        let errors = item().plan(Some(photo)).unwrap_err();
        assert!(errors.has("item_photo"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err: AppError = WizardError::DonorNotFound(DonorId::new(9)).into();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
