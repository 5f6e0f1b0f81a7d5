//! JSON API.
//!
//! Paths keep the Portuguese resource names the API has always used
//! (`doadores`, `recebedores`, `itens`, `doacoes`). Trailing slashes are
//! trimmed before routing, so `/api/doadores/` and `/api/doadores` are the
//! same endpoint.

pub mod contacts;
pub mod donations;
pub mod items;
pub mod token;
pub mod users;
pub mod wizard;

use axum::Router;

use crate::db::{DonorTable, RecipientTable};
use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(token::router())
        .merge(users::router())
        .merge(contacts::router::<DonorTable>("/api/doadores"))
        .merge(contacts::router::<RecipientTable>("/api/recebedores"))
        .merge(items::router())
        .merge(donations::router())
        .merge(wizard::router())
}
