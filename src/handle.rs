//! Async façade: each cache operation runs on the blocking pool so callers on the runtime
//! threads never wait on disk I/O.

use crate::cache::{CacheMetricsSnapshot, Defect, DiskCache};
use crate::errors::Result;
use crate::types::{CacheRule, Uid};
use std::sync::Arc;

/// Cloneable async handle over a shared [`DiskCache`].
#[derive(Clone)]
pub struct AsyncDiskCache {
    inner: Arc<DiskCache>,
}

impl From<DiskCache> for AsyncDiskCache {
    fn from(cache: DiskCache) -> Self {
        Self::new(Arc::new(cache))
    }
}

impl AsyncDiskCache {
    #[must_use]
    pub fn new(inner: Arc<DiskCache>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn inner(&self) -> &Arc<DiskCache> {
        &self.inner
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DiskCache) -> Result<T> + Send + 'static,
    {
        let cache = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&cache)).await?
    }

    pub async fn initialize(&self) {
        let cache = Arc::clone(&self.inner);
        if let Err(e) = tokio::task::spawn_blocking(move || cache.initialize()).await {
            log::error!("cache initialize task failed: {e}");
        }
    }

    /// # Errors
    /// See [`DiskCache::try_load`]; a failed blocking task is reported as `CacheError::Task`.
    pub async fn try_load(&self, uid: &str) -> Result<Option<Vec<u8>>> {
        let uid = uid.to_owned();
        self.run(move |c| c.try_load(&uid)).await
    }

    pub async fn load(&self, uid: &str) -> Option<Vec<u8>> {
        self.try_load(uid).await.unwrap_or_else(|e| {
            log::error!("cache load {uid} failed: {e}");
            None
        })
    }

    /// # Errors
    /// See [`DiskCache::try_save`].
    pub async fn try_save(&self, uid: &str, bytes: Vec<u8>, rule: CacheRule) -> Result<()> {
        let uid = uid.to_owned();
        self.run(move |c| c.try_save(&uid, &bytes, rule)).await
    }

    pub async fn save(&self, uid: &str, bytes: Vec<u8>, rule: CacheRule) -> bool {
        self.try_save(uid, bytes, rule).await.map_err(|e| log::error!("cache save {uid} failed: {e}")).is_ok()
    }

    pub async fn evict(&self, uid: &str) -> bool {
        let owned = uid.to_owned();
        self.run(move |c| c.try_evict(&owned))
            .await
            .map_err(|e| log::error!("cache evict {uid} failed: {e}"))
            .is_ok()
    }

    pub async fn clear(&self) -> bool {
        self.run(DiskCache::try_clear).await.map_err(|e| log::error!("cache clear failed: {e}")).is_ok()
    }

    /// # Errors
    /// See [`DiskCache::cache_size_on_disk`].
    pub async fn cache_size_on_disk(&self) -> Result<u64> {
        self.run(DiskCache::cache_size_on_disk).await
    }

    /// # Errors
    /// See [`DiskCache::try_keep_healthy`].
    pub async fn keep_healthy(&self) -> Result<Vec<(Uid, Defect)>> {
        self.run(DiskCache::try_keep_healthy).await
    }

    pub async fn set_max_entries(&self, max_entries: usize) -> bool {
        self.run(move |c| c.try_set_max_entries(max_entries))
            .await
            .map_err(|e| log::error!("setting max entries failed: {e}"))
            .is_ok()
    }

    pub async fn set_max_size_bytes(&self, max_size_bytes: u64) -> bool {
        self.run(move |c| c.try_set_max_size_bytes(max_size_bytes))
            .await
            .map_err(|e| log::error!("setting max size failed: {e}"))
            .is_ok()
    }

    #[must_use]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.inner.metrics_snapshot()
    }
}
