//! Donation domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use doacoes_core::{DonationId, DonationTarget, DonorId, ItemId, MonetaryAmount, RecipientId};

/// A single transfer of one item or an amount of money.
#[derive(Debug, Clone)]
pub struct Donation {
    pub id: DonationId,
    pub donor: DonorId,
    pub recipient: Option<RecipientId>,
    pub target: DonationTarget,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Whether this is a cash donation.
    #[must_use]
    pub const fn is_money(&self) -> bool {
        matches!(self.target, DonationTarget::Money(_))
    }
}

/// Flat JSON shape: `item` and `amount` are both present, one of them null.
#[derive(Serialize)]
struct DonationJson {
    id: DonationId,
    donor: DonorId,
    recipient: Option<RecipientId>,
    item: Option<ItemId>,
    amount: Option<MonetaryAmount>,
    notes: String,
    created_at: DateTime<Utc>,
}

impl Serialize for Donation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DonationJson {
            id: self.id,
            donor: self.donor,
            recipient: self.recipient,
            item: self.target.item(),
            amount: self.target.amount(),
            notes: self.notes.clone(),
            created_at: self.created_at,
        }
        .serialize(serializer)
    }
}

/// A donation with the names of everything it references, for pages.
#[derive(Debug, Clone, Serialize)]
pub struct DonationSummary {
    #[serde(flatten)]
    pub donation: Donation,
    pub donor_name: String,
    pub recipient_name: Option<String>,
    pub item_name: Option<String>,
}

impl DonationSummary {
    /// What was given, for display.
    #[must_use]
    pub fn description(&self) -> String {
        match self.donation.target {
            DonationTarget::Money(amount) => amount.format_brl(),
            DonationTarget::Item(_) => self.item_name.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn donation(target: DonationTarget) -> Donation {
        Donation {
            id: DonationId::new(1),
            donor: DonorId::new(2),
            recipient: None,
            target,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_money_donation_serializes_flat() {
        let amount = MonetaryAmount::parse("75.5").unwrap();
        let json = serde_json::to_value(donation(DonationTarget::Money(amount))).unwrap();

        assert_eq!(json["donor"], 2);
        assert_eq!(json["amount"], "75.50");
        assert!(json["item"].is_null());
        assert!(json["recipient"].is_null());
    }

    #[test]
    fn test_item_donation_serializes_flat() {
        let json =
            serde_json::to_value(donation(DonationTarget::Item(ItemId::new(9)))).unwrap();

        assert_eq!(json["item"], 9);
        assert!(json["amount"].is_null());
    }

    #[test]
    fn test_summary_description() {
        let amount = MonetaryAmount::parse("1500").unwrap();
        let summary = DonationSummary {
            donation: donation(DonationTarget::Money(amount)),
            donor_name: "Maria".to_string(),
            recipient_name: None,
            item_name: None,
        };
        assert_eq!(summary.description(), "R$ 1.500,00");

        let summary = DonationSummary {
            donation: donation(DonationTarget::Item(ItemId::new(3))),
            donor_name: "Maria".to_string(),
            recipient_name: Some("Creche".to_string()),
            item_name: Some("Cobertor".to_string()),
        };
        assert_eq!(summary.description(), "Cobertor");
    }
}
