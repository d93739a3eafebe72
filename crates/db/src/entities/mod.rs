//! `SeaORM` entities for the ledger tables.

pub mod money_requests;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod wallets;
