use crate::types::{CacheEntry, Uid};
use lru::LruCache;

/// In-memory metadata index: `uid -> CacheEntry`, ordered by recency.
///
/// Position is the only recency signal. The front is the least recently used entry and the
/// next eviction victim; the back is the most recently used. Inserting, overwriting and
/// promoting all move a key to the back in O(1). Limits are not enforced here; see
/// `cache::policy`.
pub struct CacheIndex {
    entries: LruCache<Uid, CacheEntry>,
}

impl Default for CacheIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheIndex {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: LruCache::unbounded() }
    }

    /// Build from pairs listed oldest first (the on-disk order).
    #[must_use]
    pub fn from_oldest_first(pairs: impl IntoIterator<Item = (Uid, CacheEntry)>) -> Self {
        let mut index = Self::new();
        for (uid, entry) in pairs {
            index.insert(uid, entry);
        }
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of indexed payload sizes, recomputed on every call.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().fold(0u64, |acc, (_, e)| acc.saturating_add(e.size))
    }

    /// Look up without touching recency.
    #[must_use]
    pub fn get(&self, uid: &str) -> Option<&CacheEntry> {
        self.entries.peek(uid)
    }

    #[must_use]
    pub fn contains(&self, uid: &str) -> bool {
        self.entries.contains(uid)
    }

    /// Insert or overwrite; either way the key ends up most recently used. Returns the replaced entry.
    pub fn insert(&mut self, uid: Uid, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.put(uid, entry)
    }

    pub fn remove(&mut self, uid: &str) -> Option<CacheEntry> {
        self.entries.pop(uid)
    }

    /// Move an existing key to the most recently used position.
    pub fn promote(&mut self, uid: &str) {
        self.entries.promote(uid);
    }

    /// Remove and return the least recently used entry.
    pub fn pop_oldest(&mut self) -> Option<(Uid, CacheEntry)> {
        self.entries.pop_lru()
    }

    /// Entries from least to most recently used.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = (&Uid, &CacheEntry)> {
        self.entries.iter().rev()
    }

    #[must_use]
    pub fn uids(&self) -> Vec<Uid> {
        self.iter_oldest_first().map(|(k, _)| k.clone()).collect()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<(Uid, CacheEntry)> {
        self.iter_oldest_first().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}
