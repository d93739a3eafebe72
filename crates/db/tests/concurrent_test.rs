//! Concurrent access stress tests against PostgreSQL row locks.
//!
//! These tests verify that:
//! - Racing debits on one wallet never over-draw it
//! - Opposite transfers between the same pair neither deadlock nor drift

#![allow(clippy::uninlined_format_args)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use gcoin_core::ledger::LedgerError;
use gcoin_shared::types::UserId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

use common::{services, try_connect};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_debits_never_overdraw() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(10));
    let user_id = UserId::new();
    services.wallets.create_wallet(user_id).await.unwrap();

    const ATTEMPTS: usize = 11;
    let barrier = Arc::new(Barrier::new(ATTEMPTS));
    let mut handles = Vec::with_capacity(ATTEMPTS);
    for i in 0..ATTEMPTS {
        let wallets = services.wallets.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            wallets
                .debit(user_id, dec!(10), &format!("Concurrent debit {}", i))
                .await
        }));
    }

    let results = join_all(handles).await;
    let succeeded = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(LedgerError::InsufficientFunds { .. }))))
        .count();

    assert_eq!(succeeded, 10);
    assert_eq!(insufficient, 1);
    assert_eq!(
        services.wallets.get_balance(user_id).await.unwrap(),
        Decimal::ZERO
    );
    assert!(
        services
            .reconciler()
            .verify_wallet(user_id)
            .await
            .unwrap()
            .is_consistent()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_transfers_conserve_total() {
    let Some(db) = try_connect().await else {
        return;
    };
    let services = services(db, Duration::from_secs(10));
    let a = UserId::new();
    let b = UserId::new();
    services.wallets.create_wallet(a).await.unwrap();
    services.wallets.create_wallet(b).await.unwrap();

    const TASKS: usize = 20;
    let barrier = Arc::new(Barrier::new(TASKS));
    let mut handles = Vec::with_capacity(TASKS);
    for i in 0..TASKS {
        let transfers = services.transfers.clone();
        let barrier = Arc::clone(&barrier);
        let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            transfers.transfer(from, to, dec!(2.50), "ping-pong").await
        }));
    }

    for result in join_all(handles).await {
        result.expect("task panicked").expect("transfer failed");
    }

    let total = services.wallets.get_balance(a).await.unwrap()
        + services.wallets.get_balance(b).await.unwrap();
    assert_eq!(total, dec!(200));
}
