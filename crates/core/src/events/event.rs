//! Domain events emitted after a ledger unit commits.

use gcoin_shared::types::{MoneyRequestId, UserId, WalletId};
use rust_decimal::Decimal;
use serde::Serialize;

/// Something that happened to the ledger and may interest a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEvent {
    /// A wallet was provisioned.
    #[serde(rename_all = "camelCase")]
    WalletCreated {
        /// Owner.
        user_id: UserId,
        /// New wallet.
        wallet_id: WalletId,
        /// Seeded balance.
        initial_balance: Decimal,
    },
    /// Funds moved between two wallets.
    #[serde(rename_all = "camelCase")]
    TransferCompleted {
        /// Sender.
        from_user_id: UserId,
        /// Recipient.
        to_user_id: UserId,
        /// Amount moved.
        amount: Decimal,
        /// Caller-supplied description.
        description: String,
    },
    /// A payment rail settled funds into a wallet.
    #[serde(rename_all = "camelCase")]
    FundsDeposited {
        /// Owner.
        user_id: UserId,
        /// Amount credited.
        amount: Decimal,
        /// Provider reference.
        reference: Option<String>,
        /// Balance after the deposit.
        balance: Decimal,
    },
    /// Funds left a wallet for a payment rail.
    #[serde(rename_all = "camelCase")]
    FundsWithdrawn {
        /// Owner.
        user_id: UserId,
        /// Amount debited.
        amount: Decimal,
        /// Provider reference.
        reference: Option<String>,
        /// Balance after the withdrawal.
        balance: Decimal,
    },
    /// A user asked another user to pay.
    #[serde(rename_all = "camelCase")]
    MoneyRequested {
        /// Request.
        request_id: MoneyRequestId,
        /// User asking to be paid.
        requester_id: UserId,
        /// User asked to pay.
        from_user_id: UserId,
        /// Requested amount.
        amount: Decimal,
        /// Caller-supplied description.
        description: String,
    },
    /// A money request was paid.
    #[serde(rename_all = "camelCase")]
    MoneyRequestApproved {
        /// Request.
        request_id: MoneyRequestId,
        /// User who was paid.
        requester_id: UserId,
        /// User who paid.
        from_user_id: UserId,
        /// Amount paid.
        amount: Decimal,
    },
    /// A money request was declined.
    #[serde(rename_all = "camelCase")]
    MoneyRequestRejected {
        /// Request.
        request_id: MoneyRequestId,
        /// User who asked.
        requester_id: UserId,
        /// User who declined.
        from_user_id: UserId,
        /// Requested amount.
        amount: Decimal,
        /// Reason given, if any.
        reason: Option<String>,
    },
}

impl LedgerEvent {
    /// Stable event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::WalletCreated { .. } => "WALLET_CREATED",
            Self::TransferCompleted { .. } => "TRANSFER_COMPLETED",
            Self::FundsDeposited { .. } => "FUNDS_DEPOSITED",
            Self::FundsWithdrawn { .. } => "FUNDS_WITHDRAWN",
            Self::MoneyRequested { .. } => "MONEY_REQUESTED",
            Self::MoneyRequestApproved { .. } => "MONEY_REQUEST_APPROVED",
            Self::MoneyRequestRejected { .. } => "MONEY_REQUEST_REJECTED",
        }
    }
}
