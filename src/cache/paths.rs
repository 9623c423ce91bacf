use crate::cache::config::DiskCacheConfig;
use crate::errors::{CacheError, Result};
use crate::types::StoreDirectory;
use std::path::{Path, PathBuf};

/// Sub-folder holding payload files under each base directory.
pub const PAYLOAD_DIR_NAME: &str = "imagecache";
/// Metadata file name under the persistent base directory.
pub const METADATA_FILE_NAME: &str = "imagecache_metadata.json";

/// Resolved base directories backing the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirs {
    temporary: PathBuf,
    persistent: PathBuf,
}

impl CacheDirs {
    #[must_use]
    pub fn new(temporary: PathBuf, persistent: PathBuf) -> Self {
        Self { temporary, persistent }
    }

    /// Explicit config dirs win; otherwise the OS temp dir and the OS data dir, each with `app_name` appended.
    ///
    /// # Errors
    /// Returns `CacheError::NoBaseDirectory` when the platform has no data directory.
    pub fn resolve(cfg: &DiskCacheConfig) -> Result<Self> {
        let temporary = match &cfg.temporary_dir {
            Some(p) => p.clone(),
            None => std::env::temp_dir().join(&cfg.app_name),
        };
        let persistent = match &cfg.persistent_dir {
            Some(p) => p.clone(),
            None => dirs_next::data_dir()
                .map(|d| d.join(&cfg.app_name))
                .ok_or(CacheError::NoBaseDirectory(StoreDirectory::Persistent))?,
        };
        Ok(Self::new(temporary, persistent))
    }

    #[must_use]
    pub fn base(&self, store: StoreDirectory) -> &Path {
        match store {
            StoreDirectory::Temporary => &self.temporary,
            StoreDirectory::Persistent => &self.persistent,
        }
    }

    /// `<base>/imagecache` for the given store.
    #[must_use]
    pub fn payload_dir(&self, store: StoreDirectory) -> PathBuf {
        self.base(store).join(PAYLOAD_DIR_NAME)
    }

    #[must_use]
    pub fn payload_path(&self, store: StoreDirectory, uid: &str) -> PathBuf {
        self.payload_dir(store).join(uid)
    }

    #[must_use]
    pub fn metadata_file(&self) -> PathBuf {
        self.persistent.join(METADATA_FILE_NAME)
    }

    /// Both payload directories, temporary first.
    #[must_use]
    pub fn payload_dirs(&self) -> [PathBuf; 2] {
        [self.payload_dir(StoreDirectory::Temporary), self.payload_dir(StoreDirectory::Persistent)]
    }
}
