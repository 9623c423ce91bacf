use crate::cache::config::DiskCacheConfig;
use crate::cache::index::CacheIndex;
use crate::cache::metrics::CacheMetrics;
use crate::types::Uid;
use crate::utils::fsutil::remove_file_if_exists;

/// The two independent ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_entries: usize,
    pub max_size_bytes: u64,
}

impl From<&DiskCacheConfig> for Limits {
    fn from(cfg: &DiskCacheConfig) -> Self {
        Self { max_entries: cfg.max_entries, max_size_bytes: cfg.max_size_bytes }
    }
}

impl Limits {
    /// Either ceiling strictly exceeded.
    #[must_use]
    pub fn exceeded_by(&self, index: &CacheIndex) -> bool {
        index.len() > self.max_entries || index.total_bytes() > self.max_size_bytes
    }

    /// Either ceiling reached. Gates read-hit promotion.
    #[must_use]
    pub fn saturated_by(&self, index: &CacheIndex) -> bool {
        index.len() >= self.max_entries || index.total_bytes() >= self.max_size_bytes
    }
}

/// Evict from the least recently used end until both ceilings hold. Returns evicted uids in eviction order.
///
/// A payload that cannot be deleted is logged and left behind; its entry is still dropped so the loop converges.
pub fn enforce_capacity(index: &mut CacheIndex, limits: Limits, metrics: &CacheMetrics) -> Vec<Uid> {
    let mut evicted = Vec::new();
    while limits.exceeded_by(index) {
        let Some((uid, entry)) = index.pop_oldest() else { break };
        if let Err(e) = remove_file_if_exists(&entry.path) {
            log::warn!("evicted {uid} but could not delete {}: {e}", entry.path.display());
        }
        CacheMetrics::bump(&metrics.evictions);
        crate::devlog!("evict uid={uid} size={}", entry.size);
        evicted.push(uid);
    }
    if !evicted.is_empty() {
        log::debug!("capacity eviction removed {} entries", evicted.len());
    }
    evicted
}
