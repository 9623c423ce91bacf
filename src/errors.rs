use crate::types::StoreDirectory;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid cache uid: {0:?}")]
    InvalidUid(String),

    #[error("No base directory available for {0} store")]
    NoBaseDirectory(StoreDirectory),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to persist payload: {0}")]
    Persist(String),

    #[error("Blocking task failed: {0}")]
    Task(String),
}

impl From<tempfile::PersistError> for CacheError {
    fn from(e: tempfile::PersistError) -> Self {
        Self::Persist(e.error.to_string())
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
