//! Ledger Store contract.
//!
//! A store hands out atomic units. Everything read or written through a unit
//! is isolated from other units touching the same rows and becomes visible
//! only on [`LedgerUnit::commit`]. Dropping a unit without committing discards
//! its writes.

use async_trait::async_trait;
use gcoin_shared::types::{MoneyRequestId, PageRequest, UserId, WalletId};
use rust_decimal::Decimal;

use crate::ledger::error::LedgerResult;
use crate::ledger::types::{NewTransaction, Transaction, TransactionStatus, TransactionType, Wallet};
use crate::transfer::request::MoneyRequest;

/// Durable keyed storage for wallets, transactions, and money requests.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Atomic unit type produced by this store.
    type Unit: LedgerUnit;

    /// Opens a new atomic unit.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend cannot start a transaction.
    async fn begin(&self) -> LedgerResult<Self::Unit>;

    /// Opens a read-only unit whose reads all observe one committed snapshot,
    /// so a count and the page it describes agree. Writes through it fail.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend cannot start a transaction.
    async fn begin_snapshot(&self) -> LedgerResult<Self::Unit> {
        self.begin().await
    }
}

/// Transactional handle. All writes commit together or not at all.
///
/// Methods named `lock_*` take an exclusive row lock held until the unit
/// ends; `update_wallet_balance` locks implicitly. A lock that cannot be
/// acquired within the store's bound fails with `Busy`.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Inserts a wallet. Fails with `AlreadyExists` if the user has one.
    async fn insert_wallet(&mut self, wallet: Wallet) -> LedgerResult<Wallet>;

    /// Reads a wallet without locking it.
    async fn wallet_by_user_id(&mut self, user_id: UserId) -> LedgerResult<Option<Wallet>>;

    /// Reads and exclusively locks a wallet.
    async fn lock_wallet(&mut self, user_id: UserId) -> LedgerResult<Option<Wallet>>;

    /// Applies `balance += delta` as a single conditional update.
    ///
    /// Fails with `NotFound` if the wallet is missing and with
    /// `InsufficientFunds` if the result would be negative.
    async fn update_wallet_balance(&mut self, user_id: UserId, delta: Decimal)
    -> LedgerResult<Wallet>;

    /// Appends a transaction row.
    async fn insert_transaction(&mut self, record: NewTransaction) -> LedgerResult<Transaction>;

    /// Counts rows matching `filter`.
    async fn count_transactions(&mut self, filter: &TransactionFilter) -> LedgerResult<u64>;

    /// Lists rows matching `filter` in `sort` order, one page at a time.
    async fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
        sort: TransactionSort,
        page: PageRequest,
    ) -> LedgerResult<Vec<Transaction>>;

    /// Signed sum of a wallet's `COMPLETED` rows.
    async fn completed_total(&mut self, wallet_id: WalletId) -> LedgerResult<Decimal>;

    /// Wallets in ascending id order, starting after `after`.
    async fn list_wallets(&mut self, after: Option<WalletId>, limit: u64)
    -> LedgerResult<Vec<Wallet>>;

    /// Inserts a money request.
    async fn insert_money_request(&mut self, request: MoneyRequest) -> LedgerResult<MoneyRequest>;

    /// Reads a money request without locking it.
    async fn find_money_request(&mut self, id: MoneyRequestId)
    -> LedgerResult<Option<MoneyRequest>>;

    /// Reads and exclusively locks a money request.
    async fn lock_money_request(&mut self, id: MoneyRequestId)
    -> LedgerResult<Option<MoneyRequest>>;

    /// Persists status and rejection reason of a locked request.
    async fn update_money_request(&mut self, request: MoneyRequest) -> LedgerResult<MoneyRequest>;

    /// Pending requests where the user is requester or payer, newest first.
    async fn pending_requests_for(&mut self, user_id: UserId) -> LedgerResult<Vec<MoneyRequest>>;

    /// Commits every write made through this unit and releases its locks.
    async fn commit(self) -> LedgerResult<()>;
}

/// Row filter for history queries. `None` fields match everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Owning wallet.
    pub wallet_id: WalletId,
    /// Exact type match.
    pub transaction_type: Option<TransactionType>,
    /// Exact status match.
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    /// Matches every row of a wallet.
    #[must_use]
    pub const fn for_wallet(wallet_id: WalletId) -> Self {
        Self {
            wallet_id,
            transaction_type: None,
            status: None,
        }
    }

    /// Restricts to one type.
    #[must_use]
    pub const fn with_type(mut self, transaction_type: Option<TransactionType>) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Restricts to one status.
    #[must_use]
    pub const fn with_status(mut self, status: Option<TransactionStatus>) -> Self {
        self.status = status;
        self
    }

    /// Returns true if `row` passes the filter.
    #[must_use]
    pub fn matches(&self, row: &Transaction) -> bool {
        row.wallet_id == self.wallet_id
            && self.transaction_type.is_none_or(|t| t == row.transaction_type)
            && self.status.is_none_or(|s| s == row.status)
    }
}

/// Sortable history columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    /// Creation time.
    #[default]
    CreatedAt,
    /// Amount.
    Amount,
    /// Transaction type, in declaration order.
    Type,
    /// Status, in declaration order.
    Status,
}

impl SortField {
    /// Parses a column name; anything unrecognised falls back to `createdAt`.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            Some("amount") => Self::Amount,
            Some("type") => Self::Type,
            Some("status") => Self::Status,
            _ => Self::CreatedAt,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses a direction; anything other than `asc` is descending.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s.map(str::to_ascii_lowercase).as_deref() {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }
}

/// History ordering. Ties break on insertion order in the same direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionSort {
    /// Column.
    pub field: SortField,
    /// Direction.
    pub order: SortOrder,
}

impl TransactionSort {
    /// Newest rows first.
    pub const NEWEST_FIRST: Self = Self {
        field: SortField::CreatedAt,
        order: SortOrder::Desc,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(None, SortField::CreatedAt)]
    #[case(Some("amount"), SortField::Amount)]
    #[case(Some("type"), SortField::Type)]
    #[case(Some("status"), SortField::Status)]
    #[case(Some("balance"), SortField::CreatedAt)]
    fn test_sort_field_fallback(#[case] input: Option<&str>, #[case] expected: SortField) {
        assert_eq!(SortField::parse_or_default(input), expected);
    }

    #[rstest]
    #[case(None, SortOrder::Desc)]
    #[case(Some("asc"), SortOrder::Asc)]
    #[case(Some("ASC"), SortOrder::Asc)]
    #[case(Some("sideways"), SortOrder::Desc)]
    fn test_sort_order_fallback(#[case] input: Option<&str>, #[case] expected: SortOrder) {
        assert_eq!(SortOrder::parse_or_default(input), expected);
    }

    #[test]
    fn test_filter_matches() {
        let wallet_id = WalletId::new();
        let row = Transaction::from_new(NewTransaction::completed(
            wallet_id,
            TransactionType::Deposit,
            dec!(10),
            "Bank deposit",
        ));

        assert!(TransactionFilter::for_wallet(wallet_id).matches(&row));
        assert!(
            TransactionFilter::for_wallet(wallet_id)
                .with_type(Some(TransactionType::Deposit))
                .with_status(Some(TransactionStatus::Completed))
                .matches(&row)
        );
        assert!(
            !TransactionFilter::for_wallet(wallet_id)
                .with_type(Some(TransactionType::Credit))
                .matches(&row)
        );
        assert!(!TransactionFilter::for_wallet(WalletId::new()).matches(&row));
    }
}
