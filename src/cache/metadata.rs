//! Metadata file persistence and commit batching.
//!
//! The file is a single JSON object mapping `uid` to its entry. Keys are written oldest
//! first so that reloading reproduces the recency order. Content that cannot be read or
//! parsed is discarded wholesale and the cache starts empty.

use crate::cache::index::CacheIndex;
use crate::errors::Result;
use crate::types::{CacheEntry, Uid};
use crate::utils::fsutil;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io;
use std::path::Path;

struct IndexRef<'a>(&'a CacheIndex);

impl Serialize for IndexRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter_oldest_first())
    }
}

/// JSON object decoded with its key order intact.
struct OrderedEntries(Vec<(Uid, CacheEntry)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of uid to cache entry")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((uid, entry)) = map.next_entry::<Uid, CacheEntry>()? {
                    out.push((uid, entry));
                }
                Ok(OrderedEntries(out))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Serialize the index, oldest entry first.
///
/// # Errors
/// Returns a JSON error if serialization fails.
pub fn encode(index: &CacheIndex) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&IndexRef(index))?)
}

/// Decode a metadata document into an index.
///
/// # Errors
/// Returns a JSON error on malformed or schema-incompatible content.
pub fn decode(bytes: &[u8]) -> Result<CacheIndex> {
    let OrderedEntries(pairs) = serde_json::from_slice(bytes)?;
    Ok(CacheIndex::from_oldest_first(pairs))
}

/// Read the metadata file. A missing or unusable file yields an empty index.
#[must_use]
pub fn read_index(path: &Path) -> CacheIndex {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return CacheIndex::new(),
        Err(e) => {
            log::warn!("cache metadata {} unreadable, starting empty: {e}", path.display());
            return CacheIndex::new();
        }
    };
    match decode(&bytes) {
        Ok(index) => index,
        Err(e) => {
            log::warn!("cache metadata {} corrupt, starting empty: {e}", path.display());
            CacheIndex::new()
        }
    }
}

/// Replace the metadata file with the full index. The new document is staged beside the
/// file and renamed over it, so a crash leaves either the old or the new index on disk.
///
/// # Errors
/// Returns an error if encoding, staging or the rename fails.
pub fn write_index(path: &Path, index: &CacheIndex) -> Result<()> {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str())) else {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("invalid metadata path {}", path.display())).into());
    };
    let bytes = encode(index)?;
    fsutil::write_atomic(dir, name, &bytes)?;
    Ok(())
}

/// What a commit attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Written,
    Deferred,
}

/// Counts deferred commits so that frequent reads do not rewrite the metadata file each time.
#[derive(Debug, Default)]
pub struct CommitTracker {
    pending: usize,
}

impl CommitTracker {
    /// Whether this attempt must write. A deferred attempt is counted.
    pub fn should_write(&mut self, force: bool, over_capacity: bool, max_ops: usize) -> bool {
        if force || over_capacity || self.pending >= max_ops {
            return true;
        }
        self.pending += 1;
        false
    }

    pub fn mark_written(&mut self) {
        self.pending = 0;
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }
}
