//! Doações Core - Shared types library.
//!
//! This crate provides the types and rules shared by every Doações component:
//! - `admin` - Web application (pages + JSON API) for ADMIN and GERENTE staff
//! - `cli` - Command-line tools for migrations, admin bootstrap and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Validation lives here so that every entry point (page
//! forms, API payloads, the donation wizard, seed files) applies exactly the
//! same rules before anything is written.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, item categories, monetary amounts
//! - [`validation`] - Drafts that validate into the records the database accepts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{
    ContactDetails, ContactDraft, DonationDetails, DonationDraft, DonationTarget, FieldError,
    ItemDetails, ItemDraft, ValidationErrors,
};
