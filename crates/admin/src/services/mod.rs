//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password login and account management
//! - `media` - Item photo storage
//! - `tokens` - Opaque API bearer tokens
//! - `wizard` - Donor, recipient and donation in one transaction

pub mod auth;
pub mod media;
pub mod tokens;
pub mod wizard;

pub use auth::{AuthError, AuthService};
pub use media::{MediaError, MediaStore, PhotoUpload};
pub use tokens::{TokenError, TokenService};
pub use wizard::{WizardError, WizardInput, WizardService};
