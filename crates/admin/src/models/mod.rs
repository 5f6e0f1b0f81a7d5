//! Domain models.
//!
//! Validated domain objects returned by the repositories. They serialize to
//! the JSON shapes the API returns.

pub mod contact;
pub mod donation;
pub mod item;
pub mod session;
pub mod token;
pub mod user;

pub use contact::{Contact, Donor, Recipient};
pub use donation::{Donation, DonationSummary};
pub use item::Item;
pub use session::{CurrentUser, keys as session_keys};
pub use token::{IssuedTokens, TokenKind};
pub use user::User;
