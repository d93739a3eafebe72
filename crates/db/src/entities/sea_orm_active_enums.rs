//! `SeaORM` active enums mirroring the PostgreSQL enum types.
//!
//! Variant order matches the `CREATE TYPE` order so that `ORDER BY` on an
//! enum column agrees with the core's `Ord` derive.

use gcoin_core::ledger::{TransactionStatus as CoreStatus, TransactionType as CoreType};
use gcoin_core::transfer::MoneyRequestStatus as CoreRequestStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    #[sea_orm(string_value = "CREDIT")]
    Credit,
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    #[sea_orm(string_value = "WITHDRAWAL")]
    Withdrawal,
    #[sea_orm(string_value = "DEPOSIT")]
    Deposit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "money_request_status")]
pub enum MoneyRequestStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl From<CoreType> for TransactionType {
    fn from(value: CoreType) -> Self {
        match value {
            CoreType::Credit => Self::Credit,
            CoreType::Debit => Self::Debit,
            CoreType::Transfer => Self::Transfer,
            CoreType::Withdrawal => Self::Withdrawal,
            CoreType::Deposit => Self::Deposit,
        }
    }
}

impl From<TransactionType> for CoreType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Credit => Self::Credit,
            TransactionType::Debit => Self::Debit,
            TransactionType::Transfer => Self::Transfer,
            TransactionType::Withdrawal => Self::Withdrawal,
            TransactionType::Deposit => Self::Deposit,
        }
    }
}

impl From<CoreStatus> for TransactionStatus {
    fn from(value: CoreStatus) -> Self {
        match value {
            CoreStatus::Pending => Self::Pending,
            CoreStatus::Completed => Self::Completed,
            CoreStatus::Failed => Self::Failed,
            CoreStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<TransactionStatus> for CoreStatus {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
            TransactionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<CoreRequestStatus> for MoneyRequestStatus {
    fn from(value: CoreRequestStatus) -> Self {
        match value {
            CoreRequestStatus::Pending => Self::Pending,
            CoreRequestStatus::Approved => Self::Approved,
            CoreRequestStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<MoneyRequestStatus> for CoreRequestStatus {
    fn from(value: MoneyRequestStatus) -> Self {
        match value {
            MoneyRequestStatus::Pending => Self::Pending,
            MoneyRequestStatus::Approved => Self::Approved,
            MoneyRequestStatus::Rejected => Self::Rejected,
        }
    }
}
