use crate::errors::{CacheError, Result};
use crate::utils::fsutil::STAGING_PREFIX;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Caller-supplied identifier of a cached payload. Also used as the payload file name.
pub type Uid = String;

/// Default lifetime of an entry when the rule does not say otherwise.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Which base directory backs a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreDirectory {
    #[default]
    Temporary,
    Persistent,
}

impl fmt::Display for StoreDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporary => f.write_str("temporary"),
            Self::Persistent => f.write_str("persistent"),
        }
    }
}

/// Per-save policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheRule {
    pub max_age: Duration,
    pub store_directory: StoreDirectory,
    pub checksum: bool,
}

impl Default for CacheRule {
    fn default() -> Self {
        Self { max_age: DEFAULT_MAX_AGE, store_directory: StoreDirectory::Temporary, checksum: false }
    }
}

impl CacheRule {
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use]
    pub fn persistent(mut self) -> Self {
        self.store_directory = StoreDirectory::Persistent;
        self
    }

    #[must_use]
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }
}

/// Metadata for one cached payload, as stored in `imagecache_metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub path: PathBuf,
    /// Milliseconds since the Unix epoch of the last write.
    pub created_time: i64,
    /// Lifetime in milliseconds, counted from `created_time`.
    pub max_age: i64,
    #[serde(rename = "crc32", default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u32>,
    pub size: u64,
}

impl CacheEntry {
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.created_time.saturating_add(self.max_age)
    }

    #[must_use]
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at()
    }
}

/// Current wall clock in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Rejects uids that cannot be used verbatim as a single file name.
///
/// # Errors
/// Returns `CacheError::InvalidUid` for empty, `.`/`..`, or separator-bearing uids, and for
/// names reserved for staging files.
pub fn validate_uid(uid: &str) -> Result<()> {
    let bad = uid.is_empty()
        || uid == "."
        || uid == ".."
        || uid.contains(['/', '\\', '\0'])
        || uid.starts_with(STAGING_PREFIX);
    if bad { Err(CacheError::InvalidUid(uid.to_owned())) } else { Ok(()) }
}
