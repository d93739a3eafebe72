//! JSON error responses.
//!
//! Every failure leaves the API as `{"error": CODE, "message": text}` with the
//! status the error kind carries. Infrastructure faults hide their detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gcoin_core::ledger::LedgerError;
use gcoin_shared::AppError;
use serde_json::json;
use tracing::error;

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// A ledger operation failed.
    Ledger(LedgerError),
    /// A request-level failure outside the ledger.
    App(AppError),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl ApiError {
    fn parts(&self) -> (u16, &'static str, String) {
        match self {
            Self::Ledger(LedgerError::Storage(detail) | LedgerError::Internal(detail)) => {
                error!(error = %detail, "Ledger infrastructure failure");
                (500, self.code(), "An internal error occurred".to_string())
            }
            Self::Ledger(e) => (e.status_code(), e.error_code(), e.to_string()),
            Self::App(e) => (e.status_code(), e.error_code(), e.to_string()),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::App(e) => e.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}
