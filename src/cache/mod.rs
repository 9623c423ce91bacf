mod config;
mod core;
mod health;
mod index;
mod metadata;
mod metrics;
mod paths;
mod policy;
mod size;

pub use config::{DEFAULT_MAX_COMMIT_OPS, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_SIZE_BYTES, DiskCacheConfig};
pub use self::core::DiskCache;
pub use health::Defect;
pub use index::CacheIndex;
pub use metadata::CommitOutcome;
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use paths::{CacheDirs, METADATA_FILE_NAME, PAYLOAD_DIR_NAME};
pub use policy::Limits;
pub use size::dir_size;
