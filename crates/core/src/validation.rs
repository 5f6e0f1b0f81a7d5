//! Validation rules for everything that gets written.
//!
//! Callers deserialize a *draft* (loose, mostly optional strings) and call
//! `validate()` to get the matching *details* type. Repositories only accept
//! details types, so a record that skipped validation cannot be stored.
//!
//! Drafts deserialize from both JSON and `application/x-www-form-urlencoded`
//! bodies: ids and amounts may arrive as numbers or strings, and blank strings
//! count as absent.

use serde::{Deserialize, Serialize};

use crate::types::{DonorId, Email, ItemCategory, ItemId, MonetaryAmount, RecipientId};

/// Field name used for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Maximum length of names and addresses.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Maximum length of phone numbers.
pub const MAX_PHONE_LENGTH: usize = 20;

// =============================================================================
// Errors
// =============================================================================

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field, or [`NON_FIELD_ERRORS`].
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

/// Every validation failure found in one input.
#[derive(thiserror::Error, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", summary(.0))]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// An empty error list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// A list holding a single field error.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// A list holding a single non-field error.
    #[must_use]
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::single(NON_FIELD_ERRORS, message)
    }

    /// Record a failure for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Append every error from `other`.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Whether no failure was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The recorded failures, in the order they were found.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Messages recorded for `field`.
    pub fn messages_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Whether any failure was recorded for `field`.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.messages_for(field).next().is_some()
    }

    /// Re-key the errors under `prefix`.
    ///
    /// Field errors become `{prefix}_{field}`; non-field errors keep their key
    /// and get `{prefix}: ` in front of the message.
    #[must_use]
    pub fn scoped(self, prefix: &str) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|e| {
                    if e.field == NON_FIELD_ERRORS {
                        FieldError {
                            field: e.field,
                            message: format!("{prefix}: {}", e.message),
                        }
                    } else {
                        FieldError {
                            field: format!("{prefix}_{}", e.field),
                            message: e.message,
                        }
                    }
                })
                .collect(),
        )
    }

    /// `Ok(value)` when empty, `Err(self)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` if any failure was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

// =============================================================================
// Lenient deserialization helpers
// =============================================================================

/// Serde helpers shared by the draft types.
pub mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
        Bool(bool),
    }

    /// Accept a string, number or null; blank strings become `None`.
    ///
    /// # Errors
    ///
    /// Fails for arrays and objects.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Scalar>::deserialize(deserializer)?;
        Ok(value.and_then(|v| {
            let s = match v {
                Scalar::Text(s) => s,
                Scalar::Number(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            };
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }))
    }

    /// Accept a JSON bool or an HTML checkbox value.
    ///
    /// `"on"`, `"true"`, `"1"` and `"yes"` are true; any other text is false.
    ///
    /// # Errors
    ///
    /// Fails for arrays and objects.
    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Scalar>::deserialize(deserializer)?;
        Ok(value.map(|v| match v {
            Scalar::Bool(b) => b,
            Scalar::Number(n) => n.as_i64() == Some(1),
            Scalar::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "on" | "true" | "1" | "yes"
            ),
        }))
    }
}

fn parse_id<T: std::str::FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<&str>,
) -> Option<T> {
    let raw = raw?;
    match raw.parse::<T>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, format!("\"{raw}\" is not a valid id"));
            None
        }
    }
}

fn required_text(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> String {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, "this field is required");
    } else if value.chars().count() > MAX_TEXT_LENGTH {
        errors.add(
            field,
            format!("must be at most {MAX_TEXT_LENGTH} characters"),
        );
    }
    value.to_owned()
}

fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

// =============================================================================
// Donors and recipients
// =============================================================================

/// Unvalidated donor or recipient input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactDraft {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
}

/// A donor or recipient that passed validation.
///
/// At least one of `email` and `phone` is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: String,
}

impl ContactDraft {
    /// Check the contact rules.
    ///
    /// # Errors
    ///
    /// Returns every failure found: a missing name, a malformed email, an
    /// overlong phone or address, and the absence of both email and phone.
    pub fn validate(&self) -> Result<ContactDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name.as_deref());

        let email = match optional_text(self.email.as_deref()) {
            Some(raw) => match Email::parse(&raw) {
                Ok(email) => Some(email),
                Err(e) => {
                    errors.add("email", e.to_string());
                    None
                }
            },
            None => None,
        };

        let phone = optional_text(self.phone.as_deref());
        if phone
            .as_ref()
            .is_some_and(|p| p.chars().count() > MAX_PHONE_LENGTH)
        {
            errors.add(
                "phone",
                format!("must be at most {MAX_PHONE_LENGTH} characters"),
            );
        }

        let address = optional_text(self.address.as_deref());
        if address
            .as_ref()
            .is_some_and(|a| a.chars().count() > MAX_TEXT_LENGTH)
        {
            errors.add(
                "address",
                format!("must be at most {MAX_TEXT_LENGTH} characters"),
            );
        }

        if optional_text(self.email.as_deref()).is_none() && phone.is_none() {
            errors.add(
                NON_FIELD_ERRORS,
                "at least one of email or phone must be provided",
            );
        }

        errors.finish(ContactDetails {
            name,
            email,
            phone,
            address,
            notes: optional_text(self.notes.as_deref()).unwrap_or_default(),
        })
    }
}

// =============================================================================
// Items
// =============================================================================

/// Unvalidated item input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDraft {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub donor: Option<String>,
}

/// An item that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetails {
    pub name: String,
    pub category: ItemCategory,
    pub description: String,
    pub available: bool,
    pub donor: Option<DonorId>,
}

impl ItemDraft {
    /// Check the item rules.
    ///
    /// Availability defaults to `true` when not given.
    ///
    /// # Errors
    ///
    /// Returns every failure found: a missing name, a missing or unknown
    /// category, or a malformed donor id.
    pub fn validate(&self) -> Result<ItemDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name.as_deref());

        let category = match ItemCategory::parse(self.category.as_deref().unwrap_or_default()) {
            Ok(category) => Some(category),
            Err(e) => {
                errors.add("category", e.to_string());
                None
            }
        };

        let donor = parse_id::<DonorId>(&mut errors, "donor", self.donor.as_deref());

        match category {
            Some(category) if errors.is_empty() => Ok(ItemDetails {
                name,
                category,
                description: optional_text(self.description.as_deref()).unwrap_or_default(),
                available: self.available.unwrap_or(true),
                donor,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Donations
// =============================================================================

/// What a donation transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationTarget {
    /// A physical item.
    Item(ItemId),
    /// Cash.
    Money(MonetaryAmount),
}

impl DonationTarget {
    /// The item id, if this is an item donation.
    #[must_use]
    pub const fn item(&self) -> Option<ItemId> {
        match self {
            Self::Item(id) => Some(*id),
            Self::Money(_) => None,
        }
    }

    /// The amount, if this is a cash donation.
    #[must_use]
    pub const fn amount(&self) -> Option<MonetaryAmount> {
        match self {
            Self::Item(_) => None,
            Self::Money(amount) => Some(*amount),
        }
    }
}

/// Unvalidated donation input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationDraft {
    #[serde(default, deserialize_with = "lenient::text")]
    pub donor: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub recipient: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub item: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
}

/// A donation that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationDetails {
    pub donor: DonorId,
    pub recipient: Option<RecipientId>,
    pub target: DonationTarget,
    pub notes: String,
}

impl DonationDraft {
    /// Check the donation rules.
    ///
    /// # Errors
    ///
    /// Returns every failure found: a missing donor, neither or both of item
    /// and amount, an amount that is not strictly positive, or malformed ids.
    pub fn validate(&self) -> Result<DonationDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let donor = parse_id::<DonorId>(&mut errors, "donor", self.donor.as_deref());
        if self.donor.is_none() {
            errors.add("donor", "this field is required");
        }

        let recipient = parse_id::<RecipientId>(&mut errors, "recipient", self.recipient.as_deref());
        let item = parse_id::<ItemId>(&mut errors, "item", self.item.as_deref());

        let target = match (&self.item, &self.amount) {
            (None, None) => {
                errors.add(NON_FIELD_ERRORS, "either an item or an amount is required");
                None
            }
            (Some(_), Some(_)) => {
                errors.add(
                    NON_FIELD_ERRORS,
                    "a donation cannot have both an item and an amount",
                );
                None
            }
            (Some(_), None) => item.map(DonationTarget::Item),
            (None, Some(raw)) => match MonetaryAmount::parse(raw) {
                Ok(amount) => Some(DonationTarget::Money(amount)),
                Err(e) => {
                    errors.add("amount", e.to_string());
                    None
                }
            },
        };

        match (donor, target) {
            (Some(donor), Some(target)) if errors.is_empty() => Ok(DonationDetails {
                donor,
                recipient,
                target,
                notes: optional_text(self.notes.as_deref()).unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check a new password and its confirmation.
///
/// Errors are keyed `password` (too short) and `password2` (mismatch).
///
/// # Errors
///
/// Returns the failures found.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }
    if password != confirmation {
        errors.add("password2", "passwords do not match");
    }

    errors.finish(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn contact(name: &str, email: &str, phone: &str) -> ContactDraft {
        ContactDraft {
            name: Some(name.to_owned()),
            email: Some(email.to_owned()),
            phone: Some(phone.to_owned()),
            ..ContactDraft::default()
        }
    }

    // -------------------------------------------------------------------------
    // Contacts
    // -------------------------------------------------------------------------

    #[test]
    fn test_contact_with_email_only() {
        let details = contact("Maria", "maria@Email.com", "").validate().unwrap();
        assert_eq!(details.name, "Maria");
        assert_eq!(details.email.unwrap().as_str(), "maria@email.com");
        assert_eq!(details.phone, None);
        assert_eq!(details.notes, "");
    }

    #[test]
    fn test_contact_with_phone_only() {
        let details = contact("Joao", "  ", "11 99999-0000").validate().unwrap();
        assert_eq!(details.email, None);
        assert_eq!(details.phone.as_deref(), Some("11 99999-0000"));
    }

    #[test]
    fn test_contact_requires_email_or_phone() {
        let errors = contact("Ana", "", "").validate().unwrap_err();
        assert!(errors.has(NON_FIELD_ERRORS));
        assert!(!errors.has("name"));
    }

    #[test]
    fn test_contact_requires_name() {
        let errors = contact("   ", "ana@email.com", "").validate().unwrap_err();
        assert!(errors.has("name"));
    }

    #[test]
    fn test_contact_reports_all_failures() {
        let draft = ContactDraft {
            email: Some("not-an-email".to_owned()),
            phone: Some("1".repeat(21)),
            ..ContactDraft::default()
        };
        let errors = draft.validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("email"));
        assert!(errors.has("phone"));
        // an email was given, even if invalid
        assert!(!errors.has(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_contact_from_form_blanks_are_absent() {
        let draft: ContactDraft =
            serde_json::from_str(r#"{"name": "Pedro", "email": "", "phone": 11988887777}"#)
                .unwrap();
        let details = draft.validate().unwrap();
        assert_eq!(details.email, None);
        assert_eq!(details.phone.as_deref(), Some("11988887777"));
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    #[test]
    fn test_item_defaults_to_available() {
        let draft = ItemDraft {
            name: Some("Camiseta".to_owned()),
            category: Some("RO".to_owned()),
            ..ItemDraft::default()
        };
        let details = draft.validate().unwrap();
        assert!(details.available);
        assert_eq!(details.category, ItemCategory::Roupas);
        assert_eq!(details.donor, None);
    }

    #[test]
    fn test_item_rejects_missing_and_unknown_category() {
        let missing = ItemDraft {
            name: Some("Mesa".to_owned()),
            ..ItemDraft::default()
        };
        assert!(missing.validate().unwrap_err().has("category"));

        let unknown = ItemDraft {
            name: Some("Mesa".to_owned()),
            category: Some("XX".to_owned()),
            ..ItemDraft::default()
        };
        assert!(unknown.validate().unwrap_err().has("category"));
    }

    #[test]
    fn test_item_rejects_missing_name() {
        let draft = ItemDraft {
            category: Some("LI".to_owned()),
            ..ItemDraft::default()
        };
        assert!(draft.validate().unwrap_err().has("name"));
    }

    #[test]
    fn test_item_checkbox_and_donor_from_strings() {
        let draft: ItemDraft = serde_json::from_str(
            r#"{"name": "Livro", "category": "li", "available": "on", "donor": "3"}"#,
        )
        .unwrap();
        let details = draft.validate().unwrap();
        assert!(details.available);
        assert_eq!(details.donor, Some(DonorId::new(3)));

        let draft: ItemDraft = serde_json::from_str(
            r#"{"name": "Livro", "category": "LI", "available": false, "donor": "abc"}"#,
        )
        .unwrap();
        assert!(draft.validate().unwrap_err().has("donor"));
    }

    // -------------------------------------------------------------------------
    // Donations
    // -------------------------------------------------------------------------

    #[test]
    fn test_donation_with_amount() {
        let draft: DonationDraft =
            serde_json::from_str(r#"{"donor": 1, "amount": "50.00", "recipient": null}"#).unwrap();
        let details = draft.validate().unwrap();
        assert_eq!(details.donor, DonorId::new(1));
        assert_eq!(details.recipient, None);
        assert_eq!(
            details.target.amount().unwrap().to_string(),
            "50.00"
        );
        assert_eq!(details.target.item(), None);
    }

    #[test]
    fn test_donation_with_item_and_recipient() {
        let draft: DonationDraft =
            serde_json::from_str(r#"{"donor": "1", "item": 4, "recipient": 2}"#).unwrap();
        let details = draft.validate().unwrap();
        assert_eq!(details.target, DonationTarget::Item(ItemId::new(4)));
        assert_eq!(details.recipient, Some(RecipientId::new(2)));
    }

    #[test]
    fn test_donation_requires_donor() {
        let draft = DonationDraft {
            amount: Some("10".to_owned()),
            ..DonationDraft::default()
        };
        assert!(draft.validate().unwrap_err().has("donor"));
    }

    #[test]
    fn test_donation_requires_exactly_one_target() {
        let neither = DonationDraft {
            donor: Some("1".to_owned()),
            ..DonationDraft::default()
        };
        assert!(neither.validate().unwrap_err().has(NON_FIELD_ERRORS));

        let both = DonationDraft {
            donor: Some("1".to_owned()),
            item: Some("2".to_owned()),
            amount: Some("10".to_owned()),
            ..DonationDraft::default()
        };
        assert!(both.validate().unwrap_err().has(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_donation_rejects_non_positive_amount() {
        for amount in ["0", "-1", "0.00"] {
            let draft = DonationDraft {
                donor: Some("1".to_owned()),
                amount: Some(amount.to_owned()),
                ..DonationDraft::default()
            };
            assert!(draft.validate().unwrap_err().has("amount"), "{amount}");
        }
    }

    // -------------------------------------------------------------------------
    // Errors and passwords
    // -------------------------------------------------------------------------

    #[test]
    fn test_scoped_errors() {
        let errors = contact("", "", "").validate().unwrap_err().scoped("donor");
        assert!(errors.has("donor_name"));
        let non_field: Vec<_> = errors.messages_for(NON_FIELD_ERRORS).collect();
        assert_eq!(non_field.len(), 1);
        assert!(non_field[0].starts_with("donor: "));
    }

    #[test]
    fn test_errors_serialize_as_list() {
        let errors = ValidationErrors::single("name", "this field is required");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"field": "name", "message": "this field is required"}])
        );
        assert_eq!(errors.to_string(), "name: this field is required");
    }

    #[test]
    fn test_new_password_rules() {
        assert!(validate_new_password("longenough", "longenough").is_ok());

        let errors = validate_new_password("short", "short").unwrap_err();
        assert!(errors.has("password"));
        assert!(!errors.has("password2"));

        let errors = validate_new_password("longenough", "different").unwrap_err();
        assert!(errors.has("password2"));
    }
}
