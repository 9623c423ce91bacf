//! Utility modules: developer events, fs helpers, logger, numeric conversions.
pub mod devlog;
pub mod fsutil;
pub mod logger;
pub mod num;
