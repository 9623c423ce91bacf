//! Entry validation and the self-healing pass that reconciles the index with the filesystem.

use crate::cache::index::CacheIndex;
use crate::cache::metrics::CacheMetrics;
use crate::checksum::{crc32, crc32_file};
use crate::types::{CacheEntry, Uid};
use crate::utils::fsutil::remove_file_if_exists;
use std::fmt;
use std::io;

/// Why an indexed entry is no longer servable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Defect {
    /// Backing file is gone.
    Missing,
    /// `now > created_time + max_age`.
    Expired,
    /// Recorded CRC-32 differs from the file contents.
    ChecksumMismatch,
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing",
            Self::Expired => "expired",
            Self::ChecksumMismatch => "checksum-mismatch",
        })
    }
}

/// Result of reading an entry for a load.
#[derive(Debug)]
pub enum Checked {
    Valid(Vec<u8>),
    Invalid(Defect),
}

fn exists(entry: &CacheEntry) -> io::Result<bool> {
    match std::fs::metadata(&entry.path) {
        Ok(m) => Ok(m.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Check existence, expiry and checksum without keeping the payload in memory.
///
/// # Errors
/// Returns unexpected I/O failures (anything but a missing file).
pub fn inspect(entry: &CacheEntry, now_ms: i64) -> io::Result<Option<Defect>> {
    if !exists(entry)? {
        return Ok(Some(Defect::Missing));
    }
    if entry.is_expired_at(now_ms) {
        return Ok(Some(Defect::Expired));
    }
    if let Some(expected) = entry.checksum {
        match crc32_file(&entry.path) {
            Ok(actual) if actual != expected => return Ok(Some(Defect::ChecksumMismatch)),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Some(Defect::Missing)),
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Same checks as [`inspect`], returning the payload when valid.
///
/// # Errors
/// Returns unexpected I/O failures (anything but a missing file).
pub fn read_checked(entry: &CacheEntry, now_ms: i64) -> io::Result<Checked> {
    if !exists(entry)? {
        return Ok(Checked::Invalid(Defect::Missing));
    }
    if entry.is_expired_at(now_ms) {
        return Ok(Checked::Invalid(Defect::Expired));
    }
    let bytes = match std::fs::read(&entry.path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Checked::Invalid(Defect::Missing)),
        Err(e) => return Err(e),
    };
    match entry.checksum {
        Some(expected) if crc32(&bytes) != expected => Ok(Checked::Invalid(Defect::ChecksumMismatch)),
        _ => Ok(Checked::Valid(bytes)),
    }
}

/// Delete the backing file of a defective entry (a missing one has nothing to delete).
pub fn discard(uid: &str, entry: &CacheEntry, defect: Defect, metrics: &CacheMetrics) {
    if defect != Defect::Missing
        && let Err(e) = remove_file_if_exists(&entry.path)
    {
        log::warn!("could not delete {defect} payload for {uid} at {}: {e}", entry.path.display());
    }
    CacheMetrics::bump(&metrics.repairs);
    crate::devlog!("repair uid={uid} defect={defect}");
}

/// Drop every defective entry from the index. Entries whose check hits an unexpected
/// I/O error are kept and logged; the next pass retries them.
pub fn prune(index: &mut CacheIndex, now_ms: i64, metrics: &CacheMetrics) -> Vec<(Uid, Defect)> {
    let mut pruned = Vec::new();
    for (uid, entry) in index.snapshot() {
        match inspect(&entry, now_ms) {
            Ok(Some(defect)) => {
                index.remove(&uid);
                discard(&uid, &entry, defect, metrics);
                pruned.push((uid, defect));
            }
            Ok(None) => {}
            Err(e) => log::warn!("health check skipped {uid}: {e}"),
        }
    }
    if !pruned.is_empty() {
        log::warn!("health pass pruned {} cache entries", pruned.len());
    }
    pruned
}
