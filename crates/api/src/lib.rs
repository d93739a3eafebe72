//! HTTP API layer with Axum routes over the ledger core.
//!
//! This crate provides:
//! - REST routes for wallets, transfers, money requests and history
//! - The caller-identity extractor
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use gcoin_core::LedgerServices;
use gcoin_core::ledger::LedgerStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
pub struct AppState<S: LedgerStore> {
    /// Ledger services over the configured store.
    pub ledger: LedgerServices<S>,
}

impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<S: LedgerStore> AppState<S> {
    /// Wraps wired ledger services.
    #[must_use]
    pub const fn new(ledger: LedgerServices<S>) -> Self {
        Self { ledger }
    }
}

/// Creates the main application router.
pub fn create_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes::<S>())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
