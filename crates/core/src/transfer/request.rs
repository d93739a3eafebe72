//! Money request state machine.
//!
//! A request is created `PENDING` and resolves exactly once, either to
//! `APPROVED` (paid through a transfer) or to `REJECTED` (no balance effect).
//! Only the payer may resolve it.

use std::fmt;

use chrono::{DateTime, Utc};
use gcoin_shared::types::{MoneyRequestId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::error::LedgerError;

/// Money request lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoneyRequestStatus {
    /// Awaiting the payer.
    Pending,
    /// Paid.
    Approved,
    /// Declined by the payer.
    Rejected,
}

impl MoneyRequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns true once the request can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for MoneyRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pull-payment request from `requester_id` to `from_user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyRequest {
    /// Request ID.
    pub id: MoneyRequestId,
    /// User asking to receive funds.
    pub requester_id: UserId,
    /// User asked to pay.
    pub from_user_id: UserId,
    /// Requested amount.
    pub amount: Decimal,
    /// Free text shown to the payer.
    pub description: String,
    /// Lifecycle status.
    pub status: MoneyRequestStatus,
    /// Reason supplied on rejection.
    pub rejection_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl MoneyRequest {
    /// Creates a new pending request.
    #[must_use]
    pub fn pending(
        requester_id: UserId,
        from_user_id: UserId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MoneyRequestId::new(),
            requester_id,
            from_user_id,
            amount,
            description: description.into(),
            status: MoneyRequestStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if `user_id` is either party to the request.
    #[must_use]
    pub fn involves(&self, user_id: UserId) -> bool {
        self.requester_id == user_id || self.from_user_id == user_id
    }
}

/// Resolution chosen by the payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestResolution {
    /// Pay the request.
    Approve,
    /// Decline the request.
    Reject {
        /// Optional reason shown to the requester.
        reason: Option<String>,
    },
}

/// Stateless service for money request transitions.
pub struct MoneyRequestService;

impl MoneyRequestService {
    /// Validates that `actor_id` may resolve `request` and applies the
    /// resolution to a copy of it.
    ///
    /// Authorization is checked before state.
    ///
    /// # Errors
    ///
    /// * `Forbidden` if `actor_id` is not the payer
    /// * `InvalidState` if the request is not `PENDING`
    pub fn resolve(
        request: &MoneyRequest,
        actor_id: UserId,
        resolution: RequestResolution,
    ) -> Result<MoneyRequest, LedgerError> {
        let verb = match resolution {
            RequestResolution::Approve => "approve",
            RequestResolution::Reject { .. } => "reject",
        };
        if request.from_user_id != actor_id {
            return Err(LedgerError::Forbidden(format!(
                "Only the requested user can {verb} this request"
            )));
        }

        let target = match resolution {
            RequestResolution::Approve => MoneyRequestStatus::Approved,
            RequestResolution::Reject { .. } => MoneyRequestStatus::Rejected,
        };
        if !Self::is_valid_transition(request.status, target) {
            return Err(LedgerError::InvalidState(
                "Request is not pending".to_string(),
            ));
        }

        let mut resolved = request.clone();
        resolved.status = target;
        resolved.updated_at = Utc::now();
        if let RequestResolution::Reject { reason } = resolution {
            resolved.rejection_reason = reason.filter(|r| !r.trim().is_empty());
        }
        Ok(resolved)
    }

    /// Checks whether a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved
    /// - Pending → Rejected
    #[must_use]
    pub fn is_valid_transition(from: MoneyRequestStatus, to: MoneyRequestStatus) -> bool {
        matches!(
            (from, to),
            (
                MoneyRequestStatus::Pending,
                MoneyRequestStatus::Approved | MoneyRequestStatus::Rejected
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> (MoneyRequest, UserId, UserId) {
        let requester = UserId::new();
        let payer = UserId::new();
        (
            MoneyRequest::pending(requester, payer, dec!(20), "Lunch"),
            requester,
            payer,
        )
    }

    #[test]
    fn test_payer_can_approve() {
        let (req, _, payer) = request();
        let approved = MoneyRequestService::resolve(&req, payer, RequestResolution::Approve).unwrap();
        assert_eq!(approved.status, MoneyRequestStatus::Approved);
        assert_eq!(approved.amount, req.amount);
        assert_eq!(approved.rejection_reason, None);
    }

    #[test]
    fn test_requester_cannot_approve_own_request() {
        let (req, requester, _) = request();
        let err = MoneyRequestService::resolve(&req, requester, RequestResolution::Approve)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::Forbidden("Only the requested user can approve this request".into())
        );
    }

    #[test]
    fn test_reject_records_reason() {
        let (req, _, payer) = request();
        let rejected = MoneyRequestService::resolve(
            &req,
            payer,
            RequestResolution::Reject {
                reason: Some("no".into()),
            },
        )
        .unwrap();
        assert_eq!(rejected.status, MoneyRequestStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("no"));
    }

    #[test]
    fn test_blank_reason_is_dropped() {
        let (req, _, payer) = request();
        let rejected = MoneyRequestService::resolve(
            &req,
            payer,
            RequestResolution::Reject {
                reason: Some("   ".into()),
            },
        )
        .unwrap();
        assert_eq!(rejected.rejection_reason, None);
    }

    #[test]
    fn test_resolved_request_is_invalid_state() {
        let (req, _, payer) = request();
        let approved = MoneyRequestService::resolve(&req, payer, RequestResolution::Approve).unwrap();
        let err = MoneyRequestService::resolve(
            &approved,
            payer,
            RequestResolution::Reject { reason: None },
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::InvalidState("Request is not pending".into()));
    }

    #[test]
    fn test_involves_both_parties_only() {
        let (req, requester, payer) = request();
        assert!(req.involves(requester));
        assert!(req.involves(payer));
        assert!(!req.involves(UserId::new()));
    }
}
