//! In-memory Ledger Store.
//!
//! Row locks are per-key `tokio` mutexes owned by the unit until it ends.
//! An entry leaves the lock table once no unit holds or awaits it.
//! Writes are staged on the unit and applied under a single write lock at
//! commit, so other units never observe a partial update. Snapshot units
//! read from a copy of the committed state taken when they begin.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use gcoin_shared::types::{MoneyRequestId, PageRequest, UserId, WalletId};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard};

use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::store::{
    LedgerStore, LedgerUnit, SortField, SortOrder, TransactionFilter, TransactionSort,
};
use crate::ledger::types::{NewTransaction, Transaction, TransactionStatus, Wallet};
use crate::transfer::request::{MoneyRequest, MoneyRequestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockKey {
    Wallet(UserId),
    Request(MoneyRequestId),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wallet(user_id) => write!(f, "wallet of user {user_id}"),
            Self::Request(id) => write!(f, "money request {id}"),
        }
    }
}

#[derive(Default, Clone)]
struct MemoryState {
    wallets: HashMap<UserId, Wallet>,
    transactions: Vec<Transaction>,
    requests: HashMap<MoneyRequestId, MoneyRequest>,
}

struct Shared {
    state: RwLock<MemoryState>,
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
    lock_timeout: Duration,
}

impl Shared {
    /// Drops the table entry for `key` if nothing else references its mutex.
    ///
    /// `acquire` clones under the same shard lock, so a count of one here
    /// means no unit holds or waits on the mutex.
    fn forget_lock(&self, key: &LockKey) {
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Committed state as seen by one unit.
enum Committed<'a> {
    Live(RwLockReadGuard<'a, MemoryState>),
    Snapshot(&'a MemoryState),
}

impl Deref for Committed<'_> {
    type Target = MemoryState;

    fn deref(&self) -> &MemoryState {
        match self {
            Self::Live(guard) => guard,
            Self::Snapshot(state) => state,
        }
    }
}

/// Guards held by one unit, released together.
struct HeldLocks {
    shared: Arc<Shared>,
    guards: HashMap<LockKey, OwnedMutexGuard<()>>,
}

impl Drop for HeldLocks {
    fn drop(&mut self) {
        for (key, guard) in self.guards.drain() {
            drop(guard);
            self.shared.forget_lock(&key);
        }
    }
}

/// Ledger Store kept entirely in process memory.
///
/// Cloning yields another handle to the same ledger.
#[derive(Clone)]
pub struct MemoryLedgerStore {
    shared: Arc<Shared>,
}

impl MemoryLedgerStore {
    /// Creates an empty store whose units wait at most `lock_timeout` per lock.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(MemoryState::default()),
                locks: DashMap::new(),
                lock_timeout,
            }),
        }
    }

    /// Sum of every committed wallet balance.
    pub async fn total_balance(&self) -> Decimal {
        self.shared
            .state
            .read()
            .await
            .wallets
            .values()
            .map(|w| w.balance)
            .sum()
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> LedgerResult<MemoryUnit> {
        Ok(self.unit(None))
    }

    async fn begin_snapshot(&self) -> LedgerResult<MemoryUnit> {
        let snapshot = self.shared.state.read().await.clone();
        Ok(self.unit(Some(snapshot)))
    }
}

impl MemoryLedgerStore {
    fn unit(&self, snapshot: Option<MemoryState>) -> MemoryUnit {
        MemoryUnit {
            shared: Arc::clone(&self.shared),
            snapshot,
            locks: HeldLocks {
                shared: Arc::clone(&self.shared),
                guards: HashMap::new(),
            },
            wallets: HashMap::new(),
            transactions: Vec::new(),
            requests: HashMap::new(),
        }
    }
}

/// Atomic unit over a [`MemoryLedgerStore`].
pub struct MemoryUnit {
    shared: Arc<Shared>,
    snapshot: Option<MemoryState>,
    locks: HeldLocks,
    wallets: HashMap<UserId, Wallet>,
    transactions: Vec<Transaction>,
    requests: HashMap<MoneyRequestId, MoneyRequest>,
}

impl MemoryUnit {
    async fn committed(&self) -> Committed<'_> {
        match &self.snapshot {
            Some(state) => Committed::Snapshot(state),
            None => Committed::Live(self.shared.state.read().await),
        }
    }

    fn ensure_writable(&self) -> LedgerResult<()> {
        if self.snapshot.is_some() {
            return Err(LedgerError::Storage(
                "write attempted through a read-only unit".to_string(),
            ));
        }
        Ok(())
    }

    async fn acquire(&mut self, key: LockKey) -> LedgerResult<()> {
        self.ensure_writable()?;
        if self.locks.guards.contains_key(&key) {
            return Ok(());
        }

        let mutex = self.shared.locks.entry(key).or_default().value().clone();
        let Ok(guard) = tokio::time::timeout(self.shared.lock_timeout, mutex.lock_owned()).await
        else {
            self.shared.forget_lock(&key);
            return Err(LedgerError::Busy(format!(
                "timed out waiting for lock on {key}"
            )));
        };
        self.locks.guards.insert(key, guard);
        Ok(())
    }

    async fn current_wallet(&self, user_id: UserId) -> Option<Wallet> {
        if let Some(wallet) = self.wallets.get(&user_id) {
            return Some(wallet.clone());
        }
        self.committed().await.wallets.get(&user_id).cloned()
    }

    async fn current_request(&self, id: MoneyRequestId) -> Option<MoneyRequest> {
        if let Some(request) = self.requests.get(&id) {
            return Some(request.clone());
        }
        self.committed().await.requests.get(&id).cloned()
    }

    /// Committed rows followed by staged rows, tagged with insertion order.
    async fn matching_rows(&self, filter: &TransactionFilter) -> Vec<(usize, Transaction)> {
        let state = self.committed().await;
        state
            .transactions
            .iter()
            .chain(self.transactions.iter())
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(seq, row)| (seq, row.clone()))
            .collect()
    }
}

fn compare_rows(field: SortField, a: &(usize, Transaction), b: &(usize, Transaction)) -> Ordering {
    let by_field = match field {
        SortField::CreatedAt => a.1.created_at.cmp(&b.1.created_at),
        SortField::Amount => a.1.amount.cmp(&b.1.amount),
        SortField::Type => a.1.transaction_type.cmp(&b.1.transaction_type),
        SortField::Status => a.1.status.cmp(&b.1.status),
    };
    by_field.then(a.0.cmp(&b.0))
}

#[async_trait]
impl LedgerUnit for MemoryUnit {
    async fn insert_wallet(&mut self, wallet: Wallet) -> LedgerResult<Wallet> {
        self.acquire(LockKey::Wallet(wallet.user_id)).await?;
        if self.current_wallet(wallet.user_id).await.is_some() {
            return Err(LedgerError::AlreadyExists(wallet.user_id));
        }
        self.wallets.insert(wallet.user_id, wallet.clone());
        Ok(wallet)
    }

    async fn wallet_by_user_id(&mut self, user_id: UserId) -> LedgerResult<Option<Wallet>> {
        Ok(self.current_wallet(user_id).await)
    }

    async fn lock_wallet(&mut self, user_id: UserId) -> LedgerResult<Option<Wallet>> {
        self.acquire(LockKey::Wallet(user_id)).await?;
        Ok(self.current_wallet(user_id).await)
    }

    async fn update_wallet_balance(
        &mut self,
        user_id: UserId,
        delta: Decimal,
    ) -> LedgerResult<Wallet> {
        self.acquire(LockKey::Wallet(user_id)).await?;
        let mut wallet = self
            .current_wallet(user_id)
            .await
            .ok_or_else(LedgerError::wallet_not_found)?;

        let next = wallet.balance + delta;
        if next < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                available: wallet.balance,
                requested: -delta,
            });
        }
        wallet.balance = next;
        wallet.updated_at = Utc::now();
        self.wallets.insert(user_id, wallet.clone());
        Ok(wallet)
    }

    async fn insert_transaction(&mut self, record: NewTransaction) -> LedgerResult<Transaction> {
        self.ensure_writable()?;
        let known = self.wallets.values().any(|w| w.id == record.wallet_id)
            || self
                .committed()
                .await
                .wallets
                .values()
                .any(|w| w.id == record.wallet_id);
        if !known {
            return Err(LedgerError::wallet_not_found());
        }

        let row = Transaction::from_new(record);
        self.transactions.push(row.clone());
        Ok(row)
    }

    async fn count_transactions(&mut self, filter: &TransactionFilter) -> LedgerResult<u64> {
        Ok(self.matching_rows(filter).await.len() as u64)
    }

    async fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
        sort: TransactionSort,
        page: PageRequest,
    ) -> LedgerResult<Vec<Transaction>> {
        let mut rows = self.matching_rows(filter).await;
        rows.sort_by(|a, b| {
            let ord = compare_rows(sort.field, a, b);
            match sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, row)| row)
            .collect())
    }

    async fn completed_total(&mut self, wallet_id: WalletId) -> LedgerResult<Decimal> {
        let filter =
            TransactionFilter::for_wallet(wallet_id).with_status(Some(TransactionStatus::Completed));
        Ok(self
            .matching_rows(&filter)
            .await
            .iter()
            .map(|(_, row)| row.signed_amount())
            .sum())
    }

    async fn list_wallets(
        &mut self,
        after: Option<WalletId>,
        limit: u64,
    ) -> LedgerResult<Vec<Wallet>> {
        let mut merged = self.committed().await.wallets.clone();
        merged.extend(self.wallets.clone());

        let mut wallets: Vec<Wallet> = merged
            .into_values()
            .filter(|w| after.is_none_or(|a| w.id > a))
            .collect();
        wallets.sort_by_key(|w| w.id);
        wallets.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(wallets)
    }

    async fn insert_money_request(&mut self, request: MoneyRequest) -> LedgerResult<MoneyRequest> {
        self.ensure_writable()?;
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_money_request(
        &mut self,
        id: MoneyRequestId,
    ) -> LedgerResult<Option<MoneyRequest>> {
        Ok(self.current_request(id).await)
    }

    async fn lock_money_request(
        &mut self,
        id: MoneyRequestId,
    ) -> LedgerResult<Option<MoneyRequest>> {
        self.acquire(LockKey::Request(id)).await?;
        Ok(self.current_request(id).await)
    }

    async fn update_money_request(&mut self, request: MoneyRequest) -> LedgerResult<MoneyRequest> {
        self.acquire(LockKey::Request(request.id)).await?;
        if self.current_request(request.id).await.is_none() {
            return Err(LedgerError::request_not_found());
        }
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn pending_requests_for(&mut self, user_id: UserId) -> LedgerResult<Vec<MoneyRequest>> {
        let mut merged = self.committed().await.requests.clone();
        merged.extend(self.requests.clone());

        let mut pending: Vec<MoneyRequest> = merged
            .into_values()
            .filter(|r| r.status == MoneyRequestStatus::Pending && r.involves(user_id))
            .collect();
        pending.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(pending)
    }

    async fn commit(self) -> LedgerResult<()> {
        let mut state = self.shared.state.write().await;
        state.wallets.extend(self.wallets);
        state.transactions.extend(self.transactions);
        state.requests.extend(self.requests);
        drop(state);
        drop(self.locks);
        Ok(())
    }
}
