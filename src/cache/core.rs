use crate::cache::config::DiskCacheConfig;
use crate::cache::health::{self, Checked, Defect};
use crate::cache::index::CacheIndex;
use crate::cache::metadata::{self, CommitOutcome, CommitTracker};
use crate::cache::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::cache::paths::CacheDirs;
use crate::cache::policy::{Limits, enforce_capacity};
use crate::cache::size;
use crate::checksum::crc32;
use crate::errors::{CacheError, Result};
use crate::types::{CacheEntry, CacheRule, Uid, now_millis, validate_uid};
use crate::utils::fsutil::{remove_dir_all_if_exists, remove_file_if_exists, sweep_staging, write_atomic};
use crate::utils::num::{duration_to_millis_i64, usize_to_u64};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Mutable state guarded by one lock: the index (`None` until first use) and the commit batch counter.
#[derive(Default)]
struct CacheState {
    index: Option<CacheIndex>,
    commits: CommitTracker,
}

fn initialized<'a>(slot: &'a mut Option<CacheIndex>, metadata_file: &Path) -> &'a mut CacheIndex {
    slot.get_or_insert_with(|| {
        let index = metadata::read_index(metadata_file);
        log::info!("cache index loaded from {} ({} entries)", metadata_file.display(), index.len());
        index
    })
}

/// Drop a save whose metadata commit failed. A previous entry stored elsewhere is restored;
/// one stored at the same path was overwritten and goes with the new payload.
fn undo_save(index: &mut CacheIndex, uid: &str, path: &Path, prev: Option<CacheEntry>) {
    index.remove(uid);
    if let Some(prev) = prev
        && prev.path != path
    {
        index.insert(uid.to_owned(), prev);
    }
    if let Err(e) = remove_file_if_exists(path) {
        log::warn!("could not delete uncommitted payload {}: {e}", path.display());
    }
    crate::devlog!("save undone uid={uid}");
}

/// Disk-backed payload cache with LRU eviction, per-entry expiry and optional CRC-32 checks.
///
/// One instance owns one metadata file and two payload directories. Share it across the
/// process with [`DiskCache::shared`]; running two instances over the same directories is
/// unsupported. Every index read-modify-write happens under a single mutex, so callers on
/// different threads see a serialized history.
///
/// Operations come in pairs: `try_*` returns the error kind, the plain form absorbs it
/// (logging it) and reports only "got bytes / no bytes" or `true`/`false`.
pub struct DiskCache {
    config: RwLock<DiskCacheConfig>,
    dirs: CacheDirs,
    state: Mutex<CacheState>,
    metrics: CacheMetrics,
}

impl DiskCache {
    /// Creates a cache whose index is read lazily on first use.
    ///
    /// # Errors
    /// Returns an error if the base directories cannot be resolved.
    pub fn new(config: DiskCacheConfig) -> Result<Self> {
        let dirs = CacheDirs::resolve(&config)?;
        Ok(Self::with_dirs(config, dirs))
    }

    #[must_use]
    pub fn with_dirs(config: DiskCacheConfig, dirs: CacheDirs) -> Self {
        Self {
            config: RwLock::new(config),
            dirs,
            state: Mutex::new(CacheState::default()),
            metrics: CacheMetrics::default(),
        }
    }

    /// Creates a cache and reads its index immediately.
    ///
    /// # Errors
    /// Returns an error if the base directories cannot be resolved.
    pub fn open(config: DiskCacheConfig) -> Result<Self> {
        let cache = Self::new(config)?;
        cache.initialize();
        Ok(cache)
    }

    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Reads the metadata file if not already done. Idempotent; an absent or corrupt file yields an empty index.
    pub fn initialize(&self) {
        let mut state = self.state.lock();
        initialized(&mut state.index, &self.dirs.metadata_file());
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.lock().index.is_some()
    }

    fn limits(&self) -> Limits {
        Limits::from(&*self.config.read())
    }

    fn commit_locked(
        &self,
        index: &CacheIndex,
        commits: &mut CommitTracker,
        force: bool,
    ) -> Result<CommitOutcome> {
        let (limits, max_ops) = {
            let cfg = self.config.read();
            (Limits::from(&*cfg), cfg.max_commit_ops)
        };
        if !commits.should_write(force, limits.exceeded_by(index), max_ops) {
            CacheMetrics::bump(&self.metrics.commits_deferred);
            crate::devlog!("commit deferred pending={}", commits.pending());
            return Ok(CommitOutcome::Deferred);
        }
        metadata::write_index(&self.dirs.metadata_file(), index)?;
        commits.mark_written();
        CacheMetrics::bump(&self.metrics.commits_written);
        crate::devlog!("commit written entries={} force={force}", index.len());
        Ok(CommitOutcome::Written)
    }

    /// Persist the index. Without `force`, the write is deferred unless a limit is exceeded
    /// or `max_commit_ops` deferrals have accumulated.
    ///
    /// # Errors
    /// Returns an error if the metadata file cannot be written.
    pub fn commit(&self, force: bool) -> Result<CommitOutcome> {
        let mut guard = self.state.lock();
        let CacheState { index, commits } = &mut *guard;
        let index = initialized(index, &self.dirs.metadata_file());
        self.commit_locked(index, commits, force)
    }

    /// Read a payload, validating existence, expiry and checksum first.
    /// A defective entry is deleted and unindexed and reads as `None`.
    ///
    /// # Errors
    /// Returns unexpected I/O failures.
    pub fn try_load(&self, uid: &str) -> Result<Option<Vec<u8>>> {
        let mut guard = self.state.lock();
        let CacheState { index, commits } = &mut *guard;
        let index = initialized(index, &self.dirs.metadata_file());
        let Some(entry) = index.get(uid).cloned() else {
            CacheMetrics::bump(&self.metrics.misses);
            log::debug!("cache miss {uid}");
            return Ok(None);
        };
        match health::read_checked(&entry, now_millis())? {
            Checked::Invalid(defect) => {
                index.remove(uid);
                health::discard(uid, &entry, defect, &self.metrics);
                CacheMetrics::bump(&self.metrics.misses);
                log::debug!("cache entry {uid} dropped on load: {defect}");
                self.commit_locked(index, commits, false)?;
                Ok(None)
            }
            Checked::Valid(bytes) => {
                CacheMetrics::bump(&self.metrics.hits);
                if self.limits().saturated_by(index) {
                    index.promote(uid);
                    self.commit_locked(index, commits, false)?;
                }
                Ok(Some(bytes))
            }
        }
    }

    /// Never fails: errors are logged and reported as `None`.
    pub fn load(&self, uid: &str) -> Option<Vec<u8>> {
        self.try_load(uid).unwrap_or_else(|e| {
            log::error!("cache load {uid} failed: {e}");
            None
        })
    }

    /// Write a payload under `<base>/imagecache/<uid>`, index it as most recently used,
    /// enforce both limits and persist the index immediately.
    ///
    /// # Errors
    /// Returns `InvalidUid` for uids unusable as file names, or the I/O failure. A failed
    /// payload write leaves the previous payload and index untouched. A failed metadata
    /// commit unindexes the new payload and deletes it; a previous entry in the other store
    /// is restored, one in the same store is lost with it.
    pub fn try_save(&self, uid: &str, bytes: &[u8], rule: CacheRule) -> Result<()> {
        validate_uid(uid)?;
        let mut guard = self.state.lock();
        let CacheState { index, commits } = &mut *guard;
        let index = initialized(index, &self.dirs.metadata_file());

        let path = write_atomic(&self.dirs.payload_dir(rule.store_directory), uid, bytes)?;
        let entry = CacheEntry {
            path: path.clone(),
            created_time: now_millis(),
            max_age: duration_to_millis_i64(rule.max_age),
            checksum: rule.checksum.then(|| crc32(bytes)),
            size: usize_to_u64(bytes.len()),
        };
        let prev = index.insert(uid.to_owned(), entry);
        enforce_capacity(index, self.limits(), &self.metrics);
        if let Err(e) = self.commit_locked(index, commits, true) {
            undo_save(index, uid, &path, prev);
            return Err(e);
        }
        if let Some(prev) = prev
            && prev.path != path
            && let Err(e) = remove_file_if_exists(&prev.path)
        {
            log::warn!("could not delete superseded payload {}: {e}", prev.path.display());
        }
        CacheMetrics::bump(&self.metrics.inserts);
        log::debug!("cached {uid} ({} bytes, {})", bytes.len(), rule.store_directory);
        Ok(())
    }

    /// Never fails: errors are logged and reported as `false`.
    pub fn save(&self, uid: &str, bytes: &[u8], rule: CacheRule) -> bool {
        self.try_save(uid, bytes, rule)
            .map_err(|e| log::error!("cache save {uid} failed: {e}"))
            .is_ok()
    }

    /// Delete an entry and its payload. Unknown uids succeed trivially.
    ///
    /// # Errors
    /// Returns the I/O failure; the entry stays indexed in that case.
    pub fn try_evict(&self, uid: &str) -> Result<()> {
        let mut guard = self.state.lock();
        let CacheState { index, commits } = &mut *guard;
        let index = initialized(index, &self.dirs.metadata_file());
        if let Some(entry) = index.get(uid).cloned() {
            remove_file_if_exists(&entry.path)?;
            index.remove(uid);
            log::debug!("evicted {uid}");
            self.commit_locked(index, commits, false)?;
        }
        Ok(())
    }

    pub fn evict(&self, uid: &str) -> bool {
        self.try_evict(uid).map_err(|e| log::error!("cache evict {uid} failed: {e}")).is_ok()
    }

    fn clear_locked(&self, state: &mut CacheState) -> Result<()> {
        let mut first_err: Option<CacheError> = None;
        for dir in self.dirs.payload_dirs() {
            if let Err(e) = remove_dir_all_if_exists(&dir) {
                first_err.get_or_insert(e.into());
            }
        }
        if let Err(e) = remove_file_if_exists(&self.dirs.metadata_file()) {
            first_err.get_or_insert(e.into());
        }
        // Next use re-reads the metadata file, which is gone.
        *state = CacheState::default();
        match first_err {
            Some(e) => Err(e),
            None => {
                log::info!("cache cleared");
                Ok(())
            }
        }
    }

    /// Remove both payload directories and the metadata file, whatever the index says.
    ///
    /// # Errors
    /// Returns the first deletion failure; the remaining deletions are still attempted.
    pub fn try_clear(&self) -> Result<()> {
        let mut guard = self.state.lock();
        self.clear_locked(&mut guard)
    }

    pub fn clear(&self) -> bool {
        self.try_clear().map_err(|e| log::error!("cache clear failed: {e}")).is_ok()
    }

    /// Bytes actually present in both payload directories, independent of the index.
    ///
    /// # Errors
    /// Returns the I/O failure met while walking.
    pub fn cache_size_on_disk(&self) -> Result<u64> {
        let _guard = self.state.lock();
        Ok(size::cache_size_on_disk(&self.dirs)?)
    }

    /// Drop every missing, expired or checksum-failing entry, delete leftovers of interrupted
    /// writes, re-apply the limits and force a commit. Returns what was pruned for a defect (capacity evictions are not listed).
    ///
    /// # Errors
    /// Returns an error if the metadata file cannot be written.
    pub fn try_keep_healthy(&self) -> Result<Vec<(Uid, Defect)>> {
        let mut guard = self.state.lock();
        let CacheState { index, commits } = &mut *guard;
        let index = initialized(index, &self.dirs.metadata_file());
        let pruned = health::prune(index, now_millis(), &self.metrics);
        for dir in self.dirs.payload_dirs() {
            match sweep_staging(&dir) {
                Ok(0) => {}
                Ok(n) => log::warn!("removed {n} interrupted writes from {}", dir.display()),
                Err(e) => log::warn!("could not sweep {}: {e}", dir.display()),
            }
        }
        enforce_capacity(index, self.limits(), &self.metrics);
        self.commit_locked(index, commits, true)?;
        Ok(pruned)
    }

    pub fn keep_healthy(&self) -> bool {
        self.try_keep_healthy().map_err(|e| log::error!("cache health pass failed: {e}")).is_ok()
    }

    fn reapply_limits(&self, state: &mut CacheState) -> Result<()> {
        let CacheState { index, commits } = state;
        // Not loaded yet: the next save or health pass enforces the new limits.
        let Some(index) = index.as_mut() else { return Ok(()) };
        let evicted = enforce_capacity(index, self.limits(), &self.metrics);
        self.commit_locked(index, commits, !evicted.is_empty())?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if evicting or committing after the change fails.
    pub fn try_set_max_entries(&self, max_entries: usize) -> Result<()> {
        let mut guard = self.state.lock();
        {
            let mut cfg = self.config.write();
            if cfg.max_entries == max_entries {
                return Ok(());
            }
            cfg.max_entries = max_entries;
        }
        self.reapply_limits(&mut guard)
    }

    pub fn set_max_entries(&self, max_entries: usize) -> bool {
        self.try_set_max_entries(max_entries)
            .map_err(|e| log::error!("setting max entries failed: {e}"))
            .is_ok()
    }

    /// `0` disables the cache and clears everything on disk.
    ///
    /// # Errors
    /// Returns an error if clearing, evicting or committing after the change fails.
    pub fn try_set_max_size_bytes(&self, max_size_bytes: u64) -> Result<()> {
        let mut guard = self.state.lock();
        {
            let mut cfg = self.config.write();
            if cfg.max_size_bytes == max_size_bytes {
                return Ok(());
            }
            cfg.max_size_bytes = max_size_bytes;
        }
        if max_size_bytes == 0 {
            return self.clear_locked(&mut guard);
        }
        self.reapply_limits(&mut guard)
    }

    pub fn set_max_size_bytes(&self, max_size_bytes: u64) -> bool {
        self.try_set_max_size_bytes(max_size_bytes)
            .map_err(|e| log::error!("setting max size failed: {e}"))
            .is_ok()
    }

    pub fn set_max_commit_ops(&self, max_commit_ops: usize) {
        self.config.write().max_commit_ops = max_commit_ops;
    }

    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.config.read().max_entries
    }

    #[must_use]
    pub fn max_size_bytes(&self) -> u64 {
        self.config.read().max_size_bytes
    }

    #[must_use]
    pub fn config(&self) -> DiskCacheConfig {
        self.config.read().clone()
    }

    #[must_use]
    pub fn dirs(&self) -> &CacheDirs {
        &self.dirs
    }

    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.dirs.metadata_file()
    }

    fn with_index<T>(&self, f: impl FnOnce(&CacheIndex) -> T) -> T {
        let mut state = self.state.lock();
        f(initialized(&mut state.index, &self.dirs.metadata_file()))
    }

    #[must_use]
    pub fn contains(&self, uid: &str) -> bool {
        self.with_index(|idx| idx.contains(uid))
    }

    #[must_use]
    pub fn entry(&self, uid: &str) -> Option<CacheEntry> {
        self.with_index(|idx| idx.get(uid).cloned())
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.with_index(CacheIndex::len)
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.with_index(CacheIndex::total_bytes)
    }

    /// Indexed uids, least recently used first.
    #[must_use]
    pub fn uids(&self) -> Vec<Uid> {
        self.with_index(CacheIndex::uids)
    }

    #[must_use]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }
}
