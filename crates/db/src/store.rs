//! PostgreSQL implementation of the Ledger Store.
//!
//! Each [`PgUnit`] wraps one database transaction. Row locks are taken with
//! `SELECT ... FOR UPDATE` and every wait is bounded by a `SET LOCAL
//! lock_timeout` issued when the unit begins, so a lock that cannot be
//! acquired in time surfaces as [`LedgerError::Busy`] instead of hanging.
//!
//! Snapshot units run as `REPEATABLE READ, READ ONLY`, so every statement in
//! them sees the same committed data.
//!
//! Dropping a unit without calling `commit` rolls the transaction back.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gcoin_core::ledger::{
    LedgerError, LedgerResult, LedgerStore, LedgerUnit, NewTransaction, SortField, SortOrder,
    Transaction, TransactionFilter, TransactionSort, Wallet,
};
use gcoin_core::transfer::MoneyRequest;
use gcoin_shared::types::{Currency, MoneyRequestId, PageRequest, TransactionId, UserId, WalletId};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    AccessMode, ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ActiveValue::Unchanged,
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    DbErr, EntityTrait, FromQueryResult, IsolationLevel, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RuntimeErr, Statement, TransactionTrait,
};
use tracing::debug;

use crate::entities::sea_orm_active_enums::{
    MoneyRequestStatus as DbRequestStatus, TransactionStatus as DbStatus,
    TransactionType as DbType,
};
use crate::entities::{money_requests, transactions, wallets};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

const COMPLETED_TOTAL_SQL: &str = r"
SELECT COALESCE(SUM(
    CASE WHEN transaction_type IN ('CREDIT', 'DEPOSIT') THEN amount ELSE -amount END
), 0) AS total
FROM transactions
WHERE wallet_id = $1 AND status = 'COMPLETED'
";

/// Ledger Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
    lock_timeout: Duration,
}

impl PgLedgerStore {
    /// Creates a store over `db`; row-lock waits give up after `lock_timeout`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, lock_timeout: Duration) -> Self {
        Self { db, lock_timeout }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Unit = PgUnit;

    async fn begin(&self) -> LedgerResult<PgUnit> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        // SET LOCAL is scoped to this transaction only.
        let sql = format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        );
        txn.execute_unprepared(&sql).await.map_err(map_db_err)?;

        Ok(PgUnit { txn })
    }

    async fn begin_snapshot(&self) -> LedgerResult<PgUnit> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(map_db_err)?;
        Ok(PgUnit { txn })
    }
}

/// One PostgreSQL transaction acting as an atomic ledger unit.
pub struct PgUnit {
    txn: DatabaseTransaction,
}

impl PgUnit {
    /// Returns a reference to the underlying transaction.
    #[must_use]
    pub const fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }
}

#[async_trait]
impl LedgerUnit for PgUnit {
    async fn insert_wallet(&mut self, wallet: Wallet) -> LedgerResult<Wallet> {
        let user_id = wallet.user_id;
        let model = wallets::ActiveModel {
            id: Set(wallet.id.into_inner()),
            user_id: Set(user_id.into_inner()),
            balance: Set(wallet.balance),
            currency: Set(wallet.currency.as_str().to_string()),
            created_at: Set(to_db_time(wallet.created_at)),
            updated_at: Set(to_db_time(wallet.updated_at)),
        }
        .insert(&self.txn)
        .await
        .map_err(|e| {
            if has_sqlstate(&e, UNIQUE_VIOLATION) {
                LedgerError::AlreadyExists(user_id)
            } else {
                map_db_err(e)
            }
        })?;

        wallet_from_model(model)
    }

    async fn wallet_by_user_id(&mut self, user_id: UserId) -> LedgerResult<Option<Wallet>> {
        wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id.into_inner()))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(wallet_from_model)
            .transpose()
    }

    async fn lock_wallet(&mut self, user_id: UserId) -> LedgerResult<Option<Wallet>> {
        debug!(user_id = %user_id, "Locking wallet row");
        wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id.into_inner()))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(wallet_from_model)
            .transpose()
    }

    async fn update_wallet_balance(
        &mut self,
        user_id: UserId,
        delta: Decimal,
    ) -> LedgerResult<Wallet> {
        let wallet = self
            .lock_wallet(user_id)
            .await?
            .ok_or_else(LedgerError::wallet_not_found)?;

        let next = wallet.balance + delta;
        if next < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                available: wallet.balance,
                requested: -delta,
            });
        }

        let model = wallets::ActiveModel {
            id: Unchanged(wallet.id.into_inner()),
            balance: Set(next),
            updated_at: Set(to_db_time(Utc::now())),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(map_db_err)?;

        wallet_from_model(model)
    }

    async fn insert_transaction(&mut self, record: NewTransaction) -> LedgerResult<Transaction> {
        let now = to_db_time(Utc::now());
        let model = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            seq: NotSet,
            wallet_id: Set(record.wallet_id.into_inner()),
            transaction_type: Set(DbType::from(record.transaction_type)),
            amount: Set(record.amount),
            description: Set(record.description),
            reference: Set(record.reference),
            status: Set(DbStatus::from(record.status)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.txn)
        .await
        .map_err(|e| {
            if has_sqlstate(&e, FOREIGN_KEY_VIOLATION) {
                LedgerError::wallet_not_found()
            } else {
                map_db_err(e)
            }
        })?;

        Ok(transaction_from_model(model))
    }

    async fn count_transactions(&mut self, filter: &TransactionFilter) -> LedgerResult<u64> {
        transactions::Entity::find()
            .filter(transaction_condition(filter))
            .count(&self.txn)
            .await
            .map_err(map_db_err)
    }

    async fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
        sort: TransactionSort,
        page: PageRequest,
    ) -> LedgerResult<Vec<Transaction>> {
        let column = match sort.field {
            SortField::CreatedAt => transactions::Column::CreatedAt,
            SortField::Amount => transactions::Column::Amount,
            SortField::Type => transactions::Column::TransactionType,
            SortField::Status => transactions::Column::Status,
        };
        let order = match sort.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let rows = transactions::Entity::find()
            .filter(transaction_condition(filter))
            .order_by(column, order.clone())
            .order_by(transactions::Column::Seq, order)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(transaction_from_model).collect())
    }

    async fn completed_total(&mut self, wallet_id: WalletId) -> LedgerResult<Decimal> {
        #[derive(Debug, FromQueryResult)]
        struct LedgerTotal {
            total: Option<Decimal>,
        }

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            COMPLETED_TOTAL_SQL,
            [wallet_id.into_inner().into()],
        );
        let row = LedgerTotal::find_by_statement(stmt)
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;

        Ok(row.and_then(|r| r.total).unwrap_or(Decimal::ZERO))
    }

    async fn list_wallets(
        &mut self,
        after: Option<WalletId>,
        limit: u64,
    ) -> LedgerResult<Vec<Wallet>> {
        let mut query = wallets::Entity::find()
            .order_by_asc(wallets::Column::Id)
            .limit(limit);
        if let Some(after) = after {
            query = query.filter(wallets::Column::Id.gt(after.into_inner()));
        }

        query
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(wallet_from_model)
            .collect()
    }

    async fn insert_money_request(&mut self, request: MoneyRequest) -> LedgerResult<MoneyRequest> {
        let model = money_requests::ActiveModel {
            id: Set(request.id.into_inner()),
            requester_id: Set(request.requester_id.into_inner()),
            from_user_id: Set(request.from_user_id.into_inner()),
            amount: Set(request.amount),
            description: Set(request.description),
            status: Set(DbRequestStatus::from(request.status)),
            rejection_reason: Set(request.rejection_reason),
            created_at: Set(to_db_time(request.created_at)),
            updated_at: Set(to_db_time(request.updated_at)),
        }
        .insert(&self.txn)
        .await
        .map_err(map_db_err)?;

        Ok(request_from_model(model))
    }

    async fn find_money_request(
        &mut self,
        id: MoneyRequestId,
    ) -> LedgerResult<Option<MoneyRequest>> {
        Ok(money_requests::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(request_from_model))
    }

    async fn lock_money_request(
        &mut self,
        id: MoneyRequestId,
    ) -> LedgerResult<Option<MoneyRequest>> {
        debug!(request_id = %id, "Locking money request row");
        Ok(money_requests::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(request_from_model))
    }

    async fn update_money_request(&mut self, request: MoneyRequest) -> LedgerResult<MoneyRequest> {
        let model = money_requests::ActiveModel {
            id: Unchanged(request.id.into_inner()),
            status: Set(DbRequestStatus::from(request.status)),
            rejection_reason: Set(request.rejection_reason),
            updated_at: Set(to_db_time(request.updated_at)),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(|e| match e {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => LedgerError::request_not_found(),
            other => map_db_err(other),
        })?;

        Ok(request_from_model(model))
    }

    async fn pending_requests_for(&mut self, user_id: UserId) -> LedgerResult<Vec<MoneyRequest>> {
        let user = user_id.into_inner();
        let rows = money_requests::Entity::find()
            .filter(money_requests::Column::Status.eq(DbRequestStatus::Pending))
            .filter(
                Condition::any()
                    .add(money_requests::Column::RequesterId.eq(user))
                    .add(money_requests::Column::FromUserId.eq(user)),
            )
            .order_by_desc(money_requests::Column::CreatedAt)
            .order_by_desc(money_requests::Column::Id)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(request_from_model).collect())
    }

    async fn commit(self) -> LedgerResult<()> {
        self.txn.commit().await.map_err(map_db_err)
    }
}

fn transaction_condition(filter: &TransactionFilter) -> Condition {
    let mut condition =
        Condition::all().add(transactions::Column::WalletId.eq(filter.wallet_id.into_inner()));
    if let Some(transaction_type) = filter.transaction_type {
        condition =
            condition.add(transactions::Column::TransactionType.eq(DbType::from(transaction_type)));
    }
    if let Some(status) = filter.status {
        condition = condition.add(transactions::Column::Status.eq(DbStatus::from(status)));
    }
    condition
}

fn to_db_time(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

fn from_db_time(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn wallet_from_model(model: wallets::Model) -> LedgerResult<Wallet> {
    let currency = model
        .currency
        .parse::<Currency>()
        .map_err(|e| LedgerError::Storage(format!("wallet {}: {e}", model.id)))?;

    Ok(Wallet {
        id: WalletId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        balance: model.balance,
        currency,
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    })
}

fn transaction_from_model(model: transactions::Model) -> Transaction {
    Transaction {
        id: TransactionId::from_uuid(model.id),
        wallet_id: WalletId::from_uuid(model.wallet_id),
        transaction_type: model.transaction_type.into(),
        amount: model.amount,
        description: model.description,
        reference: model.reference,
        status: model.status.into(),
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    }
}

fn request_from_model(model: money_requests::Model) -> MoneyRequest {
    MoneyRequest {
        id: MoneyRequestId::from_uuid(model.id),
        requester_id: UserId::from_uuid(model.requester_id),
        from_user_id: UserId::from_uuid(model.from_user_id),
        amount: model.amount,
        description: model.description,
        status: model.status.into(),
        rejection_reason: model.rejection_reason,
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    }
}

fn sqlstate(err: &DbErr) -> Option<Cow<'_, str>> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => e.code(),
        _ => None,
    }
}

fn has_sqlstate(err: &DbErr, code: &str) -> bool {
    sqlstate(err).is_some_and(|c| c == code)
}

/// Maps a database error onto the ledger's error kinds.
///
/// Lock timeouts and pool exhaustion are `Busy`; serialization failures and
/// deadlocks are `Conflict`. Both are retryable by the caller.
pub fn map_db_err(err: DbErr) -> LedgerError {
    if let Some(code) = sqlstate(&err) {
        match code.as_ref() {
            LOCK_NOT_AVAILABLE => {
                return LedgerError::Busy("timed out waiting for a row lock".to_string());
            }
            SERIALIZATION_FAILURE | DEADLOCK_DETECTED => {
                return LedgerError::Conflict(
                    "concurrent update detected, please retry".to_string(),
                );
            }
            _ => {}
        }
    }

    match err {
        DbErr::ConnectionAcquire(_) => {
            LedgerError::Busy("no database connection available".to_string())
        }
        other => LedgerError::Storage(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_busy() {
        let err = map_db_err(DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout));
        assert!(matches!(err, LedgerError::Busy(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_errors_are_storage() {
        let err = map_db_err(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, LedgerError::Storage(ref msg) if msg.contains("boom")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_time_conversion_preserves_instant() {
        let now = Utc::now();
        assert_eq!(from_db_time(to_db_time(now)), now);
    }
}
