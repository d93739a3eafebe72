//! Ledger core for G Coin wallets.
//!
//! This crate contains the ledger logic with ZERO web or database dependencies.
//! Storage is reached only through the `LedgerStore` contract.
//!
//! # Modules
//!
//! - `ledger` - Store contract, row types, in-memory store, amount policy
//! - `wallet` - Wallet provisioning and single-sided mutations
//! - `transfer` - Two-sided transfers and money requests
//! - `history` - Filtered, sorted, paginated history
//! - `events` - Post-commit events and notification delivery
//! - `reconcile` - Balance versus ledger-row audit

pub mod events;
pub mod history;
pub mod ledger;
pub mod reconcile;
pub mod transfer;
pub mod wallet;

use std::sync::Arc;

use events::{EventPublisher, IdentityLookup};
use history::HistoryService;
use ledger::{LedgerPolicy, LedgerStore};
use reconcile::Reconciler;
use transfer::TransferEngine;
use wallet::WalletManager;

/// Every ledger service wired over one store handle.
pub struct LedgerServices<S: LedgerStore> {
    /// Wallet Manager.
    pub wallets: WalletManager<S>,
    /// Transfer Engine.
    pub transfers: TransferEngine<S>,
    /// History Query Service.
    pub history: HistoryService<S>,
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for LedgerServices<S> {
    fn clone(&self) -> Self {
        Self {
            wallets: self.wallets.clone(),
            transfers: self.transfers.clone(),
            history: self.history.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> LedgerServices<S> {
    /// Wires the services. The host owns the store's lifecycle.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        policy: LedgerPolicy,
        events: EventPublisher,
        identity: Arc<dyn IdentityLookup>,
    ) -> Self {
        let policy = Arc::new(policy);
        Self {
            wallets: WalletManager::new(Arc::clone(&store), Arc::clone(&policy), events.clone()),
            transfers: TransferEngine::new(Arc::clone(&store), policy, events, identity),
            history: HistoryService::new(Arc::clone(&store)),
            store,
        }
    }

    /// A reconciler over the same store.
    #[must_use]
    pub fn reconciler(&self) -> Reconciler<S> {
        Reconciler::new(Arc::clone(&self.store))
    }

    /// The underlying store handle.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }
}
