//! History Query Service. Read-only; each page is read from one snapshot so
//! its totals match its rows.

use std::sync::Arc;

use gcoin_shared::types::{PageMeta, PageRequest, UserId};
use serde::Serialize;

use crate::history::query::HistoryQuery;
use crate::ledger::{
    LedgerError, LedgerResult, LedgerStore, LedgerUnit, Transaction, TransactionFilter,
    TransactionSort, TransactionStatus, TransactionType,
};

/// One page of transaction rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    /// Rows on this page.
    pub transactions: Vec<Transaction>,
    /// Totals and page position.
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Filtered, sorted, paginated access to a wallet's rows.
pub struct HistoryService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for HistoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> HistoryService<S> {
    /// Creates a service over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Lists the user's rows. An empty page is not an error.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no wallet.
    pub async fn list_history(&self, user_id: UserId, query: HistoryQuery) -> LedgerResult<HistoryPage> {
        let mut unit = self.store.begin_snapshot().await?;
        let wallet = unit
            .wallet_by_user_id(user_id)
            .await?
            .ok_or_else(LedgerError::wallet_not_found)?;

        let filter = TransactionFilter::for_wallet(wallet.id)
            .with_type(query.transaction_type)
            .with_status(query.status);
        page(&mut unit, &filter, query.sort, query.page).await
    }

    /// Lists the user's completed deposits, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no wallet.
    pub async fn list_deposits(&self, user_id: UserId, window: PageRequest) -> LedgerResult<HistoryPage> {
        let mut unit = self.store.begin_snapshot().await?;
        let wallet = unit
            .wallet_by_user_id(user_id)
            .await?
            .ok_or_else(LedgerError::wallet_not_found)?;

        let filter = TransactionFilter::for_wallet(wallet.id)
            .with_type(Some(TransactionType::Deposit))
            .with_status(Some(TransactionStatus::Completed));
        page(&mut unit, &filter, TransactionSort::NEWEST_FIRST, window).await
    }
}

async fn page<U: LedgerUnit>(
    unit: &mut U,
    filter: &TransactionFilter,
    sort: TransactionSort,
    window: PageRequest,
) -> LedgerResult<HistoryPage> {
    let total = unit.count_transactions(filter).await?;
    let transactions = unit.list_transactions(filter, sort, window).await?;
    Ok(HistoryPage {
        transactions,
        meta: window.meta(total),
    })
}
