//! Disk-backed payload cache.
//!
//! Payloads live as plain files under `<base>/imagecache/<uid>`, where `<base>` is the
//! temporary or the persistent directory chosen per save. A single JSON metadata file
//! (`imagecache_metadata.json` under the persistent base) records every entry in recency
//! order. The cache enforces an entry-count and a byte-size ceiling with strict LRU
//! eviction, expires entries by age, optionally verifies a CRC-32 per entry and prunes
//! anything that drifted from the filesystem.

pub mod cache;
pub mod checksum;
pub mod errors;
pub mod handle;
pub mod types;
pub mod utils;

pub use cache::{CommitOutcome, Defect, DiskCache, DiskCacheConfig};
pub use errors::{CacheError, Result};
pub use handle::AsyncDiskCache;
pub use types::{CacheEntry, CacheRule, StoreDirectory, Uid};

/// Initializes logging from `DISKCACHE_LOG_*` environment variables.
///
/// Call once at startup; the cache itself works without a logger.
///
/// # Errors
/// Returns an error if the log directory or appenders cannot be set up.
pub fn init_logging() -> std::result::Result<(), Box<dyn std::error::Error>> {
    utils::logger::configure_from_env()
}
