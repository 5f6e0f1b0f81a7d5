//! Core types for Doações.
//!
//! This module provides type-safe wrappers for the domain concepts.

pub mod amount;
pub mod category;
pub mod email;
pub mod id;
pub mod role;

pub use amount::{AmountError, MonetaryAmount};
pub use category::{CategoryError, ItemCategory};
pub use email::{Email, EmailError};
pub use id::*;
pub use role::{Capability, Role};
