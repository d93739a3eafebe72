//! API route definitions.

use axum::Router;
use gcoin_core::ledger::LedgerStore;

use crate::AppState;

pub mod health;
pub mod requests;
pub mod wallet;

/// Creates the API router with all routes.
pub fn api_routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes::<S>())
        .merge(wallet::routes::<S>())
        .merge(requests::routes::<S>())
}
