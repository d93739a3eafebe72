//! History query parameters.

use gcoin_shared::types::PageRequest;
use serde::Deserialize;

use crate::ledger::{
    LedgerError, SortField, SortOrder, TransactionSort, TransactionStatus, TransactionType,
};

/// Filter value that disables a type or status filter.
pub const WILDCARD: &str = "ALL";

/// Raw query as it arrives from a caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    /// Page size.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Transaction type or `ALL`.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Transaction status or `ALL`.
    pub status: Option<String>,
    /// `createdAt`, `amount`, `type`, or `status`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
}

/// Validated history query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Page window.
    pub page: PageRequest,
    /// Exact type match.
    pub transaction_type: Option<TransactionType>,
    /// Exact status match.
    pub status: Option<TransactionStatus>,
    /// Ordering.
    pub sort: TransactionSort,
}

impl TryFrom<HistoryParams> for HistoryQuery {
    type Error = LedgerError;

    fn try_from(params: HistoryParams) -> Result<Self, Self::Error> {
        let transaction_type = parse_filter(params.transaction_type.as_deref(), "type", |s| {
            TransactionType::parse(s)
        })?;
        let status = parse_filter(params.status.as_deref(), "status", |s| {
            TransactionStatus::parse(s)
        })?;

        Ok(Self {
            page: PageRequest::new(params.limit, params.offset),
            transaction_type,
            status,
            sort: TransactionSort {
                field: SortField::parse_or_default(params.sort_by.as_deref()),
                order: SortOrder::parse_or_default(params.sort_order.as_deref()),
            },
        })
    }
}

fn parse_filter<T>(
    raw: Option<&str>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, LedgerError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case(WILDCARD) => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| LedgerError::InvalidFilter(format!("Unknown {name} '{value}'"))),
    }
}
