//! Identity lookup used to label counterparties in descriptions and messages.
//!
//! Never consulted for authorization. Every lookup is bounded by a timeout;
//! a slow or unavailable source degrades to the bare user id.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use gcoin_shared::types::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Display details for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDisplayInfo {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact address, if known.
    pub email: Option<String>,
}

impl UserDisplayInfo {
    /// "First Last", trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Source of user display details.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Returns display details, or `None` if the user is unknown.
    async fn user_display_info(&self, user_id: UserId) -> Option<UserDisplayInfo>;
}

/// Display details for `user_id`, or `None` if unknown or not answered in time.
pub async fn display_info_within(
    lookup: &dyn IdentityLookup,
    user_id: UserId,
    timeout: Duration,
) -> Option<UserDisplayInfo> {
    match tokio::time::timeout(timeout, lookup.user_display_info(user_id)).await {
        Ok(info) => info,
        Err(_) => {
            warn!(
                user_id = %user_id,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "Identity lookup timed out"
            );
            None
        }
    }
}

/// Human-readable label for `user_id`, falling back to the id itself.
pub async fn display_label(
    lookup: &dyn IdentityLookup,
    user_id: UserId,
    timeout: Duration,
) -> String {
    display_info_within(lookup, user_id, timeout)
        .await
        .map(|info| info.full_name())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| user_id.to_string())
}

/// Failure to load a directory file.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The file could not be read.
    #[error("Failed to read user directory {path}: {source}")]
    Io {
        /// File that was read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not a JSON array of directory entries.
    #[error("Invalid user directory: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryEntry {
    user_id: UserId,
    #[serde(flatten)]
    info: UserDisplayInfo,
}

/// In-memory directory, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: Arc<DashMap<UserId, UserDisplayInfo>>,
}

impl StaticDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of `{userId, firstName, lastName, email}` entries.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let entries: Vec<DirectoryEntry> = serde_json::from_str(json)?;
        let directory = Self::new();
        for entry in entries {
            directory.insert(entry.user_id, entry.info);
        }
        Ok(directory)
    }

    /// Reads a directory file in the [`from_json`](Self::from_json) format.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Parse` if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Number of known users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// True when no user is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Adds or replaces a user's details.
    pub fn insert(&self, user_id: UserId, info: UserDisplayInfo) {
        self.users.insert(user_id, info);
    }
}

#[async_trait]
impl IdentityLookup for StaticDirectory {
    async fn user_display_info(&self, user_id: UserId) -> Option<UserDisplayInfo> {
        self.users.get(&user_id).map(|entry| entry.value().clone())
    }
}
