//! Integration tests for the PostgreSQL Ledger Store.
//!
//! Skipped when no database is reachable through `DATABASE_URL`.

#![allow(clippy::uninlined_format_args)]

mod common;

use std::time::Duration;

use gcoin_core::history::{HistoryParams, HistoryQuery};
use gcoin_core::ledger::{
    LedgerError, LedgerStore, LedgerUnit, NewTransaction, TransactionFilter, TransactionSort,
    TransactionType, Wallet,
};
use gcoin_core::transfer::MoneyRequestStatus;
use gcoin_shared::types::{PageRequest, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{services, try_connect};

#[tokio::test]
async fn test_wallet_is_provisioned_with_welcome_bonus() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(5));
    let user_id = UserId::new();

    let wallet = services.wallets.create_wallet(user_id).await.unwrap();
    assert_eq!(wallet.balance, dec!(100));

    let summary = services.wallets.get_wallet(user_id).await.unwrap();
    assert_eq!(summary.recent_transactions.len(), 1);
    assert_eq!(
        summary.recent_transactions[0].transaction_type,
        TransactionType::Credit
    );

    let err = services.wallets.create_wallet(user_id).await.unwrap_err();
    assert_eq!(err, LedgerError::AlreadyExists(user_id));
}

#[tokio::test]
async fn test_transfer_writes_paired_rows() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(5));
    let a = UserId::new();
    let b = UserId::new();
    services.wallets.create_wallet(a).await.unwrap();
    services.wallets.create_wallet(b).await.unwrap();

    let outcome = services
        .transfers
        .transfer(a, b, dec!(30.50), "lunch")
        .await
        .unwrap();
    assert_eq!(outcome.from_wallet.balance, dec!(69.50));
    assert_eq!(outcome.to_wallet.balance, dec!(130.50));

    let page = services
        .history
        .list_history(a, HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 2);
    assert_eq!(page.transactions[0].transaction_type, TransactionType::Transfer);

    let audit = services.reconciler().verify_wallet(b).await.unwrap();
    assert!(audit.is_consistent());
}

#[tokio::test]
async fn test_insufficient_funds_changes_nothing() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(5));
    let a = UserId::new();
    let b = UserId::new();
    services.wallets.create_wallet(a).await.unwrap();
    services.wallets.create_wallet(b).await.unwrap();

    let err = services
        .transfers
        .transfer(a, b, dec!(150), "too much")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    assert_eq!(services.wallets.get_balance(a).await.unwrap(), dec!(100));
    assert_eq!(services.wallets.get_balance(b).await.unwrap(), dec!(100));
}

#[tokio::test]
async fn test_dropped_unit_rolls_back() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(5));
    let store = services.store();

    let mut unit = store.begin().await.unwrap();
    let wallet = unit
        .insert_wallet(Wallet::new(UserId::new(), dec!(10)))
        .await
        .unwrap();
    unit.insert_transaction(NewTransaction::completed(
        wallet.id,
        TransactionType::Credit,
        dec!(10),
        "never committed",
    ))
    .await
    .unwrap();
    drop(unit);

    let mut unit = store.begin().await.unwrap();
    assert!(unit.wallet_by_user_id(wallet.user_id).await.unwrap().is_none());
    let count = unit
        .count_transactions(&TransactionFilter::for_wallet(wallet.id))
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_row_for_unknown_wallet_is_not_found() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(5));

    let mut unit = services.store().begin().await.unwrap();
    let err = unit
        .insert_transaction(NewTransaction::completed(
            gcoin_shared::types::WalletId::new(),
            TransactionType::Credit,
            dec!(1),
            "orphan",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn test_held_row_lock_times_out_as_busy() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_millis(200));
    let user_id = UserId::new();
    services.wallets.create_wallet(user_id).await.unwrap();

    let mut holder = services.store().begin().await.unwrap();
    holder.lock_wallet(user_id).await.unwrap();

    let err = services
        .wallets
        .debit(user_id, dec!(1), "blocked")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Busy(_)));
    assert!(err.is_retryable());

    drop(holder);
    services.wallets.debit(user_id, dec!(1), "unblocked").await.unwrap();
}

#[tokio::test]
async fn test_history_sort_and_type_filter() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(5));
    let user_id = UserId::new();
    services.wallets.create_wallet(user_id).await.unwrap();
    for amount in [dec!(10), dec!(50), dec!(5)] {
        services.wallets.debit(user_id, amount, "spend").await.unwrap();
    }

    let params: HistoryParams = serde_json::from_value(serde_json::json!({
        "type": "DEBIT",
        "sortBy": "amount",
        "sortOrder": "asc"
    }))
    .unwrap();
    let page = services
        .history
        .list_history(user_id, HistoryQuery::try_from(params).unwrap())
        .await
        .unwrap();

    let amounts: Vec<Decimal> = page.transactions.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![dec!(5), dec!(10), dec!(50)]);
    assert_eq!(page.meta.total, 3);
}

#[tokio::test]
async fn test_money_request_approval_round_trip() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(5));
    let requester = UserId::new();
    let payer = UserId::new();
    services.wallets.create_wallet(requester).await.unwrap();
    services.wallets.create_wallet(payer).await.unwrap();

    let request = services
        .transfers
        .request_money(requester, payer, dec!(25), "tickets")
        .await
        .unwrap();

    let pending = services.transfers.list_pending_requests(payer).await.unwrap();
    assert!(pending.iter().any(|r| r.id == request.id));

    services
        .transfers
        .approve_money_request(request.id, payer)
        .await
        .unwrap();
    let approved = services
        .transfers
        .get_money_request(request.id, requester)
        .await
        .unwrap();
    assert_eq!(approved.status, MoneyRequestStatus::Approved);
    assert_eq!(services.wallets.get_balance(payer).await.unwrap(), dec!(75));
    assert_eq!(
        services.wallets.get_balance(requester).await.unwrap(),
        dec!(125)
    );

    let again = services
        .transfers
        .approve_money_request(request.id, payer)
        .await
        .unwrap_err();
    assert!(matches!(again, LedgerError::InvalidState(_)));
}

#[tokio::test]
async fn test_snapshot_unit_counts_and_lists_the_same_rows() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(5));
    let user_id = UserId::new();
    let wallet = services.wallets.create_wallet(user_id).await.unwrap();
    let filter = TransactionFilter::for_wallet(wallet.id);

    let mut reader = services.store().begin_snapshot().await.unwrap();
    let total = reader.count_transactions(&filter).await.unwrap();
    assert_eq!(total, 1);

    services
        .wallets
        .credit(user_id, dec!(5), "committed mid-read")
        .await
        .unwrap();

    let rows = reader
        .list_transactions(&filter, TransactionSort::NEWEST_FIRST, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(rows.len() as u64, total);
    assert!(matches!(
        reader.lock_wallet(user_id).await,
        Err(LedgerError::Storage(_))
    ));
    drop(reader);

    let mut fresh = services.store().begin_snapshot().await.unwrap();
    assert_eq!(fresh.count_transactions(&filter).await.unwrap(), 2);
}
