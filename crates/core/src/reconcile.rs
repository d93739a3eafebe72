//! Audit-pairing check: a wallet's balance must equal the signed sum of its
//! `COMPLETED` rows. Drift is reported, never repaired.

use std::sync::Arc;

use gcoin_shared::types::{UserId, WalletId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::ledger::{LedgerError, LedgerResult, LedgerStore, LedgerUnit, Wallet};

/// Audit result for one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAudit {
    /// Wallet owner.
    pub user_id: UserId,
    /// Wallet.
    pub wallet_id: WalletId,
    /// Stored balance.
    pub balance: Decimal,
    /// Signed sum of completed rows.
    pub ledger_total: Decimal,
}

impl WalletAudit {
    /// `balance - ledger_total`.
    #[must_use]
    pub fn drift(&self) -> Decimal {
        self.balance - self.ledger_total
    }

    /// True when the balance matches its rows.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.drift().is_zero()
    }
}

/// Outcome of a full sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Wallets examined.
    pub wallets_checked: u64,
    /// Wallets whose balance disagrees with their rows.
    pub drifted: Vec<WalletAudit>,
}

/// Verifies ledger consistency wallet by wallet.
pub struct Reconciler<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Reconciler<S> {
    /// Creates a reconciler over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Audits one user's wallet.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no wallet.
    pub async fn verify_wallet(&self, user_id: UserId) -> LedgerResult<WalletAudit> {
        let mut unit = self.store.begin().await?;
        let wallet = unit
            .lock_wallet(user_id)
            .await?
            .ok_or_else(LedgerError::wallet_not_found)?;
        audit(&mut unit, &wallet).await
    }

    /// Audits every wallet in id order, `batch` wallets per unit.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn sweep(&self, batch: u64) -> LedgerResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let mut after = None;

        loop {
            let mut unit = self.store.begin().await?;
            let wallets = unit.list_wallets(after, batch.max(1)).await?;
            let Some(last) = wallets.last() else {
                break;
            };
            after = Some(last.id);

            for listed in &wallets {
                let Some(wallet) = unit.lock_wallet(listed.user_id).await? else {
                    continue;
                };
                let result = audit(&mut unit, &wallet).await?;
                report.wallets_checked += 1;
                if !result.is_consistent() {
                    warn!(
                        user_id = %result.user_id,
                        wallet_id = %result.wallet_id,
                        balance = %result.balance,
                        ledger_total = %result.ledger_total,
                        "Wallet balance drift detected"
                    );
                    report.drifted.push(result);
                }
            }
        }

        info!(
            wallets_checked = report.wallets_checked,
            drifted = report.drifted.len(),
            "Reconciliation sweep finished"
        );
        Ok(report)
    }
}

async fn audit<U: LedgerUnit>(unit: &mut U, wallet: &Wallet) -> LedgerResult<WalletAudit> {
    let ledger_total = unit.completed_total(wallet.id).await?;
    Ok(WalletAudit {
        user_id: wallet.user_id,
        wallet_id: wallet.id,
        balance: wallet.balance,
        ledger_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPublisher;
    use crate::ledger::{LedgerPolicy, MemoryLedgerStore};
    use crate::wallet::WalletManager;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_managed_wallets_are_consistent() {
        let store = Arc::new(MemoryLedgerStore::default());
        let wallets = WalletManager::new(
            Arc::clone(&store),
            Arc::new(LedgerPolicy::default()),
            EventPublisher::disabled(),
        );
        let mut users = Vec::new();
        for _ in 0..5 {
            let user_id = UserId::new();
            wallets.create_wallet(user_id).await.unwrap();
            wallets.debit(user_id, dec!(12.34), "spend").await.unwrap();
            users.push(user_id);
        }

        let reconciler = Reconciler::new(store);
        let audit = reconciler.verify_wallet(users[0]).await.unwrap();
        assert_eq!(audit.balance, dec!(87.66));
        assert!(audit.is_consistent());

        let report = reconciler.sweep(2).await.unwrap();
        assert_eq!(report.wallets_checked, 5);
        assert!(report.drifted.is_empty());
    }

    #[tokio::test]
    async fn test_unpaired_balance_change_is_reported() {
        let store = Arc::new(MemoryLedgerStore::default());
        let mut unit = store.begin().await.unwrap();
        let wallet = unit
            .insert_wallet(Wallet::new(UserId::new(), dec!(40)))
            .await
            .unwrap();
        unit.commit().await.unwrap();

        let reconciler = Reconciler::new(store);
        let audit = reconciler.verify_wallet(wallet.user_id).await.unwrap();
        assert_eq!(audit.drift(), dec!(40));

        let report = reconciler.sweep(10).await.unwrap();
        assert_eq!(report.drifted, vec![audit]);
    }

    #[tokio::test]
    async fn test_unknown_wallet_is_not_found() {
        let reconciler = Reconciler::new(Arc::new(MemoryLedgerStore::default()));
        assert!(matches!(
            reconciler.verify_wallet(UserId::new()).await,
            Err(LedgerError::NotFound(_))
        ));
    }
}
