//! Ledger error types.
//!
//! Every failure a ledger operation can report maps onto one of these kinds.
//! Balance-affecting errors are raised inside the atomic unit, so an `Err`
//! always means no state changed.

use gcoin_shared::AppError;
use gcoin_shared::types::UserId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Lookup Errors ==========
    /// Wallet, money request, or referenced user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A wallet already exists for this user.
    #[error("Wallet already exists for user {0}")]
    AlreadyExists(UserId),

    // ========== Validation Errors ==========
    /// Amount is not positive, has too many decimal places, or is out of range.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Sender and recipient are the same user.
    #[error("Cannot transfer to or request money from yourself")]
    SelfTransfer,

    /// Unrecognised type or status filter value.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    // ========== Balance Errors ==========
    /// Operation would drive a balance negative.
    #[error("Insufficient balance. Available: {available}, requested: {requested}")]
    InsufficientFunds {
        /// Balance at the time of the check.
        available: Decimal,
        /// Amount the operation tried to remove.
        requested: Decimal,
    },

    // ========== Money Request Errors ==========
    /// Actor may not act on this money request.
    #[error("{0}")]
    Forbidden(String),

    /// Money request is no longer pending.
    #[error("{0}")]
    InvalidState(String),

    // ========== Store Errors ==========
    /// A row lock could not be acquired within the configured bound.
    #[error("Ledger busy: {0}")]
    Busy(String),

    /// The store aborted the unit to keep concurrent units serializable.
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invariant violated inside the core.
    #[error("Internal ledger error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for the wallet lookup failure.
    #[must_use]
    pub fn wallet_not_found() -> Self {
        Self::NotFound("Wallet not found".to_string())
    }

    /// Shorthand for the money request lookup failure.
    #[must_use]
    pub fn request_not_found() -> Self {
        Self::NotFound("Money request not found".to_string())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidAmount(_) | Self::SelfTransfer | Self::InvalidFilter(_) => 400,
            Self::InsufficientFunds { .. } => 422,
            Self::Forbidden(_) => 403,
            Self::InvalidState(_) | Self::AlreadyExists(_) | Self::Conflict(_) => 409,
            Self::Busy(_) => 503,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SelfTransfer => "SELF_TRANSFER",
            Self::InvalidFilter(_) => "INVALID_FILTER",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Busy(_) => "BUSY",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry the whole operation from scratch.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::Conflict(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NotFound(_) => Self::NotFound(message),
            LedgerError::InvalidAmount(_)
            | LedgerError::SelfTransfer
            | LedgerError::InvalidFilter(_) => Self::Validation(message),
            LedgerError::InsufficientFunds { .. } => Self::BusinessRule(message),
            LedgerError::Forbidden(_) => Self::Forbidden(message),
            LedgerError::InvalidState(_)
            | LedgerError::AlreadyExists(_)
            | LedgerError::Conflict(_) => Self::Conflict(message),
            LedgerError::Busy(_) => Self::Busy(message),
            LedgerError::Storage(_) => Self::Database(message),
            LedgerError::Internal(_) => Self::Internal(message),
        }
    }
}
