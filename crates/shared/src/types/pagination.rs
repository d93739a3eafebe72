//! Offset pagination for history endpoints.

use serde::{Deserialize, Serialize};

/// Default number of rows per page.
pub const DEFAULT_LIMIT: u64 = 20;

/// Largest page a caller may request.
pub const MAX_LIMIT: u64 = 100;

/// Offset/limit window for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of rows to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of rows to skip.
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    /// Creates a window with the limit clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }

    /// Returns the limit, never zero.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.max(1)
    }

    /// Returns the offset.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Builds pagination metadata for a result set of `total` rows.
    #[must_use]
    pub fn meta(&self, total: u64) -> PageMeta {
        let limit = self.limit();
        PageMeta {
            total,
            total_pages: total.div_ceil(limit),
            current_page: self.offset / limit + 1,
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Total number of rows matching the filter.
    pub total: u64,
    /// `ceil(total / limit)`.
    pub total_pages: u64,
    /// `floor(offset / limit) + 1`.
    pub current_page: u64,
}
