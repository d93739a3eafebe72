//! Ledger Store contract and ledger domain types.
//!
//! This module implements the storage side of the ledger:
//! - Wallet and transaction row types
//! - The atomic-unit store contract (`LedgerStore` / `LedgerUnit`)
//! - An in-memory store for tests and single-process hosts
//! - Amount guard clauses
//! - Error types for ledger operations

pub mod error;
pub mod memory;
pub mod policy;
pub mod store;
pub mod types;

pub use error::{LedgerError, LedgerResult};
pub use memory::{MemoryLedgerStore, MemoryUnit};
pub use policy::LedgerPolicy;
pub use store::{LedgerStore, LedgerUnit, SortField, SortOrder, TransactionFilter, TransactionSort};
pub use types::{NewTransaction, Transaction, TransactionStatus, TransactionType, Wallet};
