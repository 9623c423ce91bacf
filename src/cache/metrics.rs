use std::sync::atomic::{AtomicU64, Ordering};

/// Simple metrics for observing cache behavior.
#[derive(Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
    /// Entries dropped by the capacity policy.
    pub evictions: AtomicU64,
    /// Entries dropped because their file was missing, expired or failed the checksum.
    pub repairs: AtomicU64,
    pub commits_written: AtomicU64,
    pub commits_deferred: AtomicU64,
}

impl CacheMetrics {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            repairs: self.repairs.load(Ordering::Relaxed),
            commits_written: self.commits_written.load(Ordering::Relaxed),
            commits_deferred: self.commits_deferred.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub repairs: u64,
    pub commits_written: u64,
    pub commits_deferred: u64,
}
