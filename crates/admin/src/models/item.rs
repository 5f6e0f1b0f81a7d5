//! Item domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use doacoes_core::{DonorId, ItemCategory, ItemId};

/// A donated physical good.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: ItemCategory,
    pub category_label: &'static str,
    pub description: String,
    /// Path relative to the media directory, served under `/media/`.
    pub photo: Option<String>,
    pub available: bool,
    pub donor: Option<DonorId>,
    pub donor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Public URL of the photo, if any.
    #[must_use]
    pub fn photo_url(&self) -> Option<String> {
        self.photo.as_ref().map(|p| format!("/media/{p}"))
    }
}
