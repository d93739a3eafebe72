//! Ledger domain types: wallets and transaction rows.

use chrono::{DateTime, Utc};
use gcoin_shared::types::{Currency, Money, TransactionId, UserId, WalletId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The unit every wallet is denominated in.
pub const WALLET_CURRENCY: Currency = Currency::GCoin;

/// Balance-holding record owned 1:1 by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Wallet ID.
    pub id: WalletId,
    /// Owning user.
    pub user_id: UserId,
    /// Current balance, never negative once committed.
    pub balance: Decimal,
    /// Unit of account tag.
    pub currency: Currency,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last balance change.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a fresh wallet row for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, balance: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new(),
            user_id,
            balance,
            currency: WALLET_CURRENCY,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the balance as a `Money` value.
    #[must_use]
    pub const fn money(&self) -> Money {
        Money::new(self.balance, self.currency)
    }
}

/// Kind of balance change a transaction row documents.
///
/// Declaration order is the sort order used by history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Funds added to the wallet (welcome bonus, incoming transfer, manual credit).
    Credit,
    /// Funds removed from the wallet.
    Debit,
    /// Outgoing leg of a wallet-to-wallet transfer.
    Transfer,
    /// Funds paid out to an external rail.
    Withdrawal,
    /// Funds arriving from an external rail.
    Deposit,
}

impl TransactionType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
            Self::Transfer => "TRANSFER",
            Self::Withdrawal => "WITHDRAWAL",
            Self::Deposit => "DEPOSIT",
        }
    }

    /// Parses a type from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CREDIT" => Some(Self::Credit),
            "DEBIT" => Some(Self::Debit),
            "TRANSFER" => Some(Self::Transfer),
            "WITHDRAWAL" => Some(Self::Withdrawal),
            "DEPOSIT" => Some(Self::Deposit),
            _ => None,
        }
    }

    /// Returns true if rows of this type increase the wallet balance.
    #[must_use]
    pub const fn is_inflow(&self) -> bool {
        matches!(self, Self::Credit | Self::Deposit)
    }

    /// Applies the implied sign to a positive amount.
    #[must_use]
    pub fn signed(&self, amount: Decimal) -> Decimal {
        if self.is_inflow() { amount } else { -amount }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a transaction row.
///
/// Declaration order is the sort order used by history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Awaiting an external outcome.
    Pending,
    /// Balance change applied.
    Completed,
    /// Attempt failed; no balance change.
    Failed,
    /// Withdrawn before completion; no balance change.
    Cancelled,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Row ID.
    pub id: TransactionId,
    /// Owning wallet.
    pub wallet_id: WalletId,
    /// Kind of change.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Positive amount; sign is implied by the type.
    pub amount: Decimal,
    /// Free text.
    pub description: String,
    /// External correlation id (payment provider reference).
    pub reference: Option<String>,
    /// Row status.
    pub status: TransactionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Materialises a new row from its insert payload.
    #[must_use]
    pub fn from_new(record: NewTransaction) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            wallet_id: record.wallet_id,
            transaction_type: record.transaction_type,
            amount: record.amount,
            description: record.description,
            reference: record.reference,
            status: record.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Balance effect of this row once completed.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.transaction_type.signed(self.amount)
    }
}

/// Insert payload for a transaction row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Owning wallet.
    pub wallet_id: WalletId,
    /// Kind of change.
    pub transaction_type: TransactionType,
    /// Positive amount.
    pub amount: Decimal,
    /// Free text.
    pub description: String,
    /// External correlation id.
    pub reference: Option<String>,
    /// Row status.
    pub status: TransactionStatus,
}

impl NewTransaction {
    /// A `COMPLETED` row with no external reference.
    #[must_use]
    pub fn completed(
        wallet_id: WalletId,
        transaction_type: TransactionType,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            wallet_id,
            transaction_type,
            amount,
            description: description.into(),
            reference: None,
            status: TransactionStatus::Completed,
        }
    }

    /// Attaches an external correlation id.
    #[must_use]
    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }
}
