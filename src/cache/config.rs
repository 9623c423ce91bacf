use crate::errors::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 200 * 1024 * 1024;
pub const DEFAULT_MAX_COMMIT_OPS: usize = 10;

/// Configuration for the disk cache. Limits are runtime adjustable through `DiskCache` setters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskCacheConfig {
    pub max_entries: usize,
    pub max_size_bytes: u64,
    /// Deferred (non-forced) commits tolerated before the metadata file is rewritten.
    pub max_commit_ops: usize,
    /// Folder name used under the OS temp/data directories when no explicit base is set.
    pub app_name: String,
    pub temporary_dir: Option<PathBuf>,
    pub persistent_dir: Option<PathBuf>,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_commit_ops: DEFAULT_MAX_COMMIT_OPS,
            app_name: "diskcache".to_string(),
            temporary_dir: None,
            persistent_dir: None,
        }
    }
}

impl DiskCacheConfig {
    /// Config rooted at explicit base directories; mostly useful for tests and embedding.
    #[must_use]
    pub fn with_base_dirs(temporary: impl Into<PathBuf>, persistent: impl Into<PathBuf>) -> Self {
        Self {
            temporary_dir: Some(temporary.into()),
            persistent_dir: Some(persistent.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    #[must_use]
    pub fn max_size_bytes(mut self, n: u64) -> Self {
        self.max_size_bytes = n;
        self
    }

    #[must_use]
    pub fn max_commit_ops(mut self, n: usize) -> Self {
        self.max_commit_ops = n;
        self
    }

    /// Candidate config files in precedence order (first existing wins).
    #[must_use]
    pub fn candidate_paths(cli_path: Option<&Path>) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = vec![];
        if let Some(p) = cli_path {
            paths.push(p.to_path_buf());
        }
        if let Ok(p) = std::env::var("DISKCACHE_CONFIG") {
            paths.push(PathBuf::from(p));
        }
        if let Some(cfg_dir) = dirs_next::config_dir() {
            paths.push(cfg_dir.join("diskcache.toml"));
        }
        if let Ok(cur) = std::env::current_dir() {
            paths.push(cur.join("diskcache.toml"));
        }
        paths
    }

    /// Parse a TOML document; missing keys fall back to defaults.
    ///
    /// # Errors
    /// Returns `CacheError::Toml` on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str::<Self>(s)?)
    }

    /// Precedence: env > first existing config file (CLI, `DISKCACHE_CONFIG`, user config dir, cwd) > defaults.
    ///
    /// # Errors
    /// Returns an error if the chosen file is unreadable or malformed, or an env override does not parse.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(p) = Self::candidate_paths(cli_path).into_iter().find(|p| p.exists()) {
            let s = std::fs::read_to_string(&p)?;
            cfg = Self::from_toml_str(&s)?;
            log::debug!("loaded cache config from {}", p.display());
        }
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Apply `DISKCACHE_*` overrides from a lookup function.
    ///
    /// # Errors
    /// Returns `CacheError::Config` when a numeric override does not parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
            raw.trim().parse::<T>().map_err(|_| CacheError::Config(format!("{key}={raw:?} is not a number")))
        }
        if let Some(v) = lookup("DISKCACHE_MAX_ENTRIES") {
            self.max_entries = parse("DISKCACHE_MAX_ENTRIES", &v)?;
        }
        if let Some(v) = lookup("DISKCACHE_MAX_SIZE_BYTES") {
            self.max_size_bytes = parse("DISKCACHE_MAX_SIZE_BYTES", &v)?;
        }
        if let Some(v) = lookup("DISKCACHE_MAX_COMMIT_OPS") {
            self.max_commit_ops = parse("DISKCACHE_MAX_COMMIT_OPS", &v)?;
        }
        if let Some(v) = lookup("DISKCACHE_TEMP_DIR") {
            self.temporary_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("DISKCACHE_PERSISTENT_DIR") {
            self.persistent_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }
}
