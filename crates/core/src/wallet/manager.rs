//! Wallet Manager: provisioning, balance reads, and single-sided mutations.
//!
//! Every mutation runs in one atomic unit: lock the wallet row, check,
//! change the balance, append the documenting transaction, commit. Events
//! are published only after the commit succeeds.

use std::sync::Arc;

use gcoin_shared::types::{PageRequest, UserId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use crate::events::{EventPublisher, LedgerEvent};
use crate::ledger::{
    LedgerError, LedgerPolicy, LedgerResult, LedgerStore, LedgerUnit, NewTransaction,
    Transaction, TransactionFilter, TransactionSort, TransactionType, Wallet,
};

/// Description of the seed row written at provisioning.
pub const WELCOME_BONUS_DESCRIPTION: &str = "Initial wallet balance - Welcome bonus";

/// Default description for deposits.
pub const DEPOSIT_DESCRIPTION: &str = "Bank deposit";

/// Default description for withdrawals.
pub const WITHDRAWAL_DESCRIPTION: &str = "Bank withdrawal";

/// Wallet plus its most recent rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    /// The wallet.
    #[serde(flatten)]
    pub wallet: Wallet,
    /// Newest rows first.
    pub recent_transactions: Vec<Transaction>,
}

/// Result of a mutation that writes exactly one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceipt {
    /// Wallet after the change.
    pub wallet: Wallet,
    /// The documenting row.
    pub transaction: Transaction,
}

/// Wallet lifecycle and single-sided balance mutation.
pub struct WalletManager<S: LedgerStore> {
    store: Arc<S>,
    policy: Arc<LedgerPolicy>,
    events: EventPublisher,
}

impl<S: LedgerStore> Clone for WalletManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: Arc::clone(&self.policy),
            events: self.events.clone(),
        }
    }
}

impl<S: LedgerStore> WalletManager<S> {
    /// Creates a manager over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, policy: Arc<LedgerPolicy>, events: EventPublisher) -> Self {
        Self {
            store,
            policy,
            events,
        }
    }

    /// Provisions the user's wallet, seeded with the welcome bonus.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the user already has a wallet.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn create_wallet(&self, user_id: UserId) -> LedgerResult<Wallet> {
        let bonus = self.policy.welcome_bonus;
        let mut unit = self.store.begin().await?;

        let wallet = unit.insert_wallet(Wallet::new(user_id, bonus)).await?;
        if bonus > Decimal::ZERO {
            unit.insert_transaction(NewTransaction::completed(
                wallet.id,
                TransactionType::Credit,
                bonus,
                WELCOME_BONUS_DESCRIPTION,
            ))
            .await?;
        }
        unit.commit().await?;

        info!(wallet_id = %wallet.id, initial_balance = %bonus, "Wallet created");
        self.events.publish(LedgerEvent::WalletCreated {
            user_id,
            wallet_id: wallet.id,
            initial_balance: bonus,
        });
        Ok(wallet)
    }

    /// Reads the current balance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no wallet.
    pub async fn get_balance(&self, user_id: UserId) -> LedgerResult<Decimal> {
        let mut unit = self.store.begin().await?;
        let wallet = unit
            .wallet_by_user_id(user_id)
            .await?
            .ok_or_else(LedgerError::wallet_not_found)?;
        Ok(wallet.balance)
    }

    /// Reads the wallet together with its most recent rows.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no wallet.
    pub async fn get_wallet(&self, user_id: UserId) -> LedgerResult<WalletSummary> {
        let mut unit = self.store.begin().await?;
        let wallet = unit
            .wallet_by_user_id(user_id)
            .await?
            .ok_or_else(LedgerError::wallet_not_found)?;
        let recent_transactions = unit
            .list_transactions(
                &TransactionFilter::for_wallet(wallet.id),
                TransactionSort::NEWEST_FIRST,
                PageRequest::new(Some(self.policy.recent_transactions), Some(0)),
            )
            .await?;
        Ok(WalletSummary {
            wallet,
            recent_transactions,
        })
    }

    /// Adds funds and records a `CREDIT` row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` or `NotFound`.
    #[instrument(skip_all, fields(user_id = %user_id, amount = %amount))]
    pub async fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        description: &str,
    ) -> LedgerResult<Wallet> {
        self.policy.validate_amount(amount)?;
        let receipt = self
            .apply(user_id, TransactionType::Credit, amount, description, None)
            .await?;
        Ok(receipt.wallet)
    }

    /// Removes funds and records a `DEBIT` row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount`, `NotFound`, or `InsufficientFunds`.
    #[instrument(skip_all, fields(user_id = %user_id, amount = %amount))]
    pub async fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        description: &str,
    ) -> LedgerResult<Wallet> {
        self.policy.validate_amount(amount)?;
        let receipt = self
            .apply(user_id, TransactionType::Debit, amount, description, None)
            .await?;
        Ok(receipt.wallet)
    }

    /// Records funds settled by an external payment rail.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` outside the deposit bounds, or `NotFound`.
    #[instrument(skip_all, fields(user_id = %user_id, amount = %amount))]
    pub async fn deposit(
        &self,
        user_id: UserId,
        amount: Decimal,
        reference: Option<String>,
        description: Option<&str>,
    ) -> LedgerResult<LedgerReceipt> {
        self.policy.validate_deposit(amount)?;
        let receipt = self
            .apply(
                user_id,
                TransactionType::Deposit,
                amount,
                description.unwrap_or(DEPOSIT_DESCRIPTION),
                reference.clone(),
            )
            .await?;

        self.events.publish(LedgerEvent::FundsDeposited {
            user_id,
            amount,
            reference,
            balance: receipt.wallet.balance,
        });
        Ok(receipt)
    }

    /// Records funds paid out to an external payment rail.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount`, `NotFound`, or `InsufficientFunds`.
    #[instrument(skip_all, fields(user_id = %user_id, amount = %amount))]
    pub async fn withdraw(
        &self,
        user_id: UserId,
        amount: Decimal,
        reference: Option<String>,
        description: Option<&str>,
    ) -> LedgerResult<LedgerReceipt> {
        self.policy.validate_amount(amount)?;
        let receipt = self
            .apply(
                user_id,
                TransactionType::Withdrawal,
                amount,
                description.unwrap_or(WITHDRAWAL_DESCRIPTION),
                reference.clone(),
            )
            .await?;

        self.events.publish(LedgerEvent::FundsWithdrawn {
            user_id,
            amount,
            reference,
            balance: receipt.wallet.balance,
        });
        Ok(receipt)
    }

    /// Checks a deposit amount without touching the ledger.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` outside the deposit bounds.
    pub fn validate_amount(&self, amount: Decimal) -> LedgerResult<()> {
        self.policy.validate_deposit(amount)
    }

    async fn apply(
        &self,
        user_id: UserId,
        kind: TransactionType,
        amount: Decimal,
        description: &str,
        reference: Option<String>,
    ) -> LedgerResult<LedgerReceipt> {
        let mut unit = self.store.begin().await?;
        let (wallet, transaction) =
            apply_in_unit(&mut unit, user_id, kind, amount, description, reference).await?;
        unit.commit().await?;

        info!(
            wallet_id = %wallet.id,
            transaction_id = %transaction.id,
            kind = %kind,
            balance = %wallet.balance,
            "Wallet balance changed"
        );
        Ok(LedgerReceipt {
            wallet,
            transaction,
        })
    }
}

/// Locks the wallet, checks funds for outflows, applies the signed delta,
/// and appends one `COMPLETED` row.
pub(crate) async fn apply_in_unit<U: LedgerUnit>(
    unit: &mut U,
    user_id: UserId,
    kind: TransactionType,
    amount: Decimal,
    description: &str,
    reference: Option<String>,
) -> LedgerResult<(Wallet, Transaction)> {
    let wallet = unit
        .lock_wallet(user_id)
        .await?
        .ok_or_else(LedgerError::wallet_not_found)?;

    if !kind.is_inflow() && wallet.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            available: wallet.balance,
            requested: amount,
        });
    }

    let updated = unit
        .update_wallet_balance(user_id, kind.signed(amount))
        .await?;
    let transaction = unit
        .insert_transaction(
            NewTransaction::completed(wallet.id, kind, amount, description)
                .with_reference(reference),
        )
        .await?;
    Ok((updated, transaction))
}
