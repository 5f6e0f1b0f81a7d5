//! Donor and recipient domain types.
//!
//! Both tables have the same shape and rules, so they share one struct
//! distinguished by the id type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use doacoes_core::{DonorId, Email, RecipientId};

/// A donor or recipient.
#[derive(Debug, Clone, Serialize)]
pub struct Contact<Id> {
    pub id: Id,
    pub name: String,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Someone who gives.
pub type Donor = Contact<DonorId>;

/// Someone who receives.
pub type Recipient = Contact<RecipientId>;
