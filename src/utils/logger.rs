use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

use crate::utils::devlog::EVENTS_TARGET;

const ROLL_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Initializes the logging system from a log4rs YAML file.
///
/// # Errors
/// Returns an error if the file cannot be read or a logger is already installed.
pub fn init_path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling_appender(
    base: &Path,
    stem: &str,
    keep: u32,
) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE_BYTES)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?;
    Ok(appender)
}

/// Configure process-wide logging into `{dir}/cache.log` with size-based rolling.
/// - dir: base directory for logs; if None, current directory.
/// - level: off|error|warn|info|debug|trace
/// - retention: number of rolled files to keep (default 7)
/// - enable_events: also persist `devlog!` events to `{dir}/events.log`
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created, or a logger is already set.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    enable_events: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::create_dir_all(&base)?;
    let keep = retention.unwrap_or(DEFAULT_RETENTION);
    let lvl = parse_level(level);

    let mut builder = Config::builder()
        .appender(Appender::builder().build("cache", Box::new(rolling_appender(&base, "cache", keep)?)));
    builder = if enable_events {
        builder
            .appender(
                Appender::builder().build("events", Box::new(rolling_appender(&base, "events", keep)?)),
            )
            .logger(
                Logger::builder()
                    .appender("events")
                    .additive(false)
                    .build(EVENTS_TARGET, LevelFilter::Trace),
            )
    } else {
        builder.logger(Logger::builder().additive(false).build(EVENTS_TARGET, LevelFilter::Off))
    };

    let config = builder.build(Root::builder().appender("cache").build(lvl))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Configure logging from environment variables if present:
/// - DISKCACHE_LOG_CONFIG (a log4rs YAML file; takes over entirely when set)
/// - DISKCACHE_LOG_DIR
/// - DISKCACHE_LOG_LEVEL
/// - DISKCACHE_LOG_RETENTION
/// - DISKCACHE_DEVLOG (1|true|yes)
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(file) = std::env::var_os("DISKCACHE_LOG_CONFIG") {
        return init_path(Path::new(&file));
    }
    let dir = std::env::var("DISKCACHE_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("DISKCACHE_LOG_LEVEL").ok();
    let retention =
        std::env::var("DISKCACHE_LOG_RETENTION").ok().and_then(|s| s.parse::<u32>().ok());
    let events = std::env::var("DISKCACHE_DEVLOG")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure_logging(dir.as_deref(), level.as_deref(), retention, events)
}
