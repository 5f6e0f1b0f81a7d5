//! Seed the database with donors, recipients and items from YAML.
//!
//! # File format
//!
//! ```yaml
//! donors:
//!   - name: Maria Souza
//!     email: maria@example.org
//! recipients:
//!   - name: Creche Esperança
//!     phone: "11 3333-4444"
//! items:
//!   - name: Cobertor de lã
//!     category: CB
//!     donor: Maria Souza   # name of a donor in this file
//! ```
//!
//! Every entry goes through the same validation as the web forms. The file
//! is validated completely before anything is written, and everything is
//! inserted in one transaction.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use doacoes_admin::db::{DonorRepository, ItemRepository, RecipientRepository, RepositoryError};
use doacoes_core::{ContactDetails, ContactDraft, ItemDetails, ItemDraft, ValidationErrors};

use super::{ConnectError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid seed data: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for SeedError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub donors: Vec<ContactDraft>,
    #[serde(default)]
    pub recipients: Vec<ContactDraft>,
    /// `donor` names a donor of this file rather than holding an id.
    #[serde(default)]
    pub items: Vec<ItemDraft>,
}

/// A seed file that passed validation.
#[derive(Debug)]
pub struct SeedPlan {
    pub donors: Vec<ContactDetails>,
    pub recipients: Vec<ContactDetails>,
    /// Each item with the index of its donor in `donors`.
    pub items: Vec<(ItemDetails, Option<usize>)>,
}

impl SeedFile {
    /// Validate every entry. Errors are keyed by position, as in
    /// `donors.0_email` or `items.2_donor`.
    ///
    /// # Errors
    ///
    /// Returns every failure found in the file.
    pub fn plan(&self) -> Result<SeedPlan, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let mut validate_contacts = |section: &str, drafts: &[ContactDraft]| {
            drafts
                .iter()
                .enumerate()
                .filter_map(|(i, draft)| {
                    draft
                        .validate()
                        .map_err(|e| errors.extend(e.scoped(&format!("{section}.{i}"))))
                        .ok()
                })
                .collect::<Vec<_>>()
        };
        let donors = validate_contacts("donors", &self.donors);
        let recipients = validate_contacts("recipients", &self.recipients);

        let donor_index: HashMap<&str, usize> = self
            .donors
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.name.as_deref().map(|name| (name.trim(), i)))
            .collect();

        let mut items = Vec::with_capacity(self.items.len());
        for (i, draft) in self.items.iter().enumerate() {
            let scope = format!("items.{i}");

            let donor = match draft.donor.as_deref() {
                None => None,
                Some(name) => match donor_index.get(name.trim()) {
                    Some(&index) => Some(index),
                    None => {
                        errors.add(
                            format!("{scope}_donor"),
                            format!("no donor named \"{name}\" in this file"),
                        );
                        continue;
                    }
                },
            };

            let unlinked = ItemDraft {
                donor: None,
                ..draft.clone()
            };
            match unlinked.validate() {
                Ok(details) => items.push((details, donor)),
                Err(e) => errors.extend(e.scoped(&scope)),
            }
        }

        errors.finish(SeedPlan {
            donors,
            recipients,
            items,
        })
    }
}

/// Load `path` and insert its contents.
pub async fn run(path: &str) -> Result<(), SeedError> {
    let content = tokio::fs::read_to_string(Path::new(path))
        .await
        .map_err(|source| SeedError::Read {
            path: path.to_owned(),
            source,
        })?;

    let file: SeedFile = serde_yaml::from_str(&content)?;
    let plan = file.plan()?;

    tracing::info!(
        donors = plan.donors.len(),
        recipients = plan.recipients.len(),
        items = plan.items.len(),
        "Seed file validated"
    );

    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let mut donor_ids = Vec::with_capacity(plan.donors.len());
    for details in &plan.donors {
        donor_ids.push(DonorRepository::insert(&mut *tx, details).await?.id);
    }
    for details in &plan.recipients {
        RecipientRepository::insert(&mut *tx, details).await?;
    }
    for (details, donor) in &plan.items {
        let details = ItemDetails {
            donor: donor.and_then(|i| donor_ids.get(i).copied()),
            ..details.clone()
        };
        ItemRepository::insert(&mut *tx, &details, None).await?;
    }

    tx.commit().await?;

    tracing::info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
donors:
  - name: Maria Souza
    email: maria@example.org
  - name: João
    phone: "11 99999-0000"
recipients:
  - name: Creche Esperança
    phone: "11 3333-4444"
items:
  - name: Cobertor
    category: CB
    donor: João
  - name: Livro
    category: LI
    available: false
"#;

    #[test]
    fn test_plan_links_items_to_donors() {
        let file: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        let plan = file.plan().unwrap();

        assert_eq!(plan.donors.len(), 2);
        assert_eq!(plan.recipients.len(), 1);
        assert_eq!(plan.items[0].1, Some(1));
        assert_eq!(plan.items[1].1, None);
        assert!(!plan.items[1].0.available);
    }

    #[test]
    fn test_plan_reports_every_error_with_its_position() {
        let file: SeedFile = serde_yaml::from_str(
            r"
donors:
  - name: Sem contato
items:
  - name: Cadeira
    category: XX
  - name: Mesa
    category: MO
    donor: Ninguém
",
        )
        .unwrap();

        let errors = file.plan().unwrap_err();
        assert!(
            errors
                .errors()
                .iter()
                .any(|e| e.field.starts_with("donors.0") || e.message.starts_with("donors.0"))
        );
        assert!(errors.has("items.0_category"));
        assert!(errors.has("items.1_donor"));
    }

    #[test]
    fn test_unknown_sections_rejected() {
        assert!(serde_yaml::from_str::<SeedFile>("doadores: []").is_err());
    }
}
