//! Property-based tests for the Transfer Engine.
//!
//! Random transfer sequences over a small set of wallets must conserve the
//! total and never leave a balance negative.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use gcoin_shared::types::UserId;

use crate::events::{EventPublisher, StaticDirectory};
use crate::ledger::{LedgerError, LedgerPolicy, MemoryLedgerStore};
use crate::transfer::engine::TransferEngine;
use crate::wallet::WalletManager;

const USERS: usize = 4;

/// (from index, to index, amount in cents)
fn arb_transfer() -> impl Strategy<Value = (usize, usize, i64)> {
    (0..USERS, 0..USERS, 1i64..20_000)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Sum of balances is invariant; every failed transfer leaves both sides untouched.
    #[test]
    fn prop_transfers_conserve_and_stay_non_negative(
        transfers in proptest::collection::vec(arb_transfer(), 1..40)
    ) {
        runtime().block_on(async {
            let store = Arc::new(MemoryLedgerStore::default());
            let policy = Arc::new(LedgerPolicy::default());
            let wallets = WalletManager::new(
                Arc::clone(&store),
                Arc::clone(&policy),
                EventPublisher::disabled(),
            );
            let engine = TransferEngine::new(
                Arc::clone(&store),
                policy,
                EventPublisher::disabled(),
                Arc::new(StaticDirectory::new()),
            );

            let mut users = Vec::with_capacity(USERS);
            for _ in 0..USERS {
                let user_id = UserId::new();
                wallets.create_wallet(user_id).await.unwrap();
                users.push(user_id);
            }
            let total = store.total_balance().await;

            for (from, to, cents) in transfers {
                let amount = Decimal::new(cents, 2);
                let before_from = wallets.get_balance(users[from]).await.unwrap();
                let before_to = wallets.get_balance(users[to]).await.unwrap();

                match engine.transfer(users[from], users[to], amount, "prop").await {
                    Ok(outcome) => {
                        prop_assert_eq!(outcome.from_wallet.balance, before_from - amount);
                        prop_assert_eq!(outcome.to_wallet.balance, before_to + amount);
                    }
                    Err(LedgerError::SelfTransfer) => prop_assert_eq!(from, to),
                    Err(LedgerError::InsufficientFunds { available, requested }) => {
                        prop_assert_eq!(available, before_from);
                        prop_assert_eq!(requested, amount);
                        prop_assert!(before_from < amount);
                        prop_assert_eq!(wallets.get_balance(users[from]).await.unwrap(), before_from);
                        prop_assert_eq!(wallets.get_balance(users[to]).await.unwrap(), before_to);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {other}"),
                }

                prop_assert_eq!(store.total_balance().await, total);
                for user in &users {
                    prop_assert!(wallets.get_balance(*user).await.unwrap() >= Decimal::ZERO);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
