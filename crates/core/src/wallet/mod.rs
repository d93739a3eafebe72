//! Wallet Manager.

pub mod manager;

pub use manager::{
    DEPOSIT_DESCRIPTION, LedgerReceipt, WELCOME_BONUS_DESCRIPTION, WITHDRAWAL_DESCRIPTION,
    WalletManager, WalletSummary,
};
