use clap::{Parser, Subcommand};
use diskcache::{CacheRule, DiskCache, DiskCacheConfig};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "diskcache", version, about = "Inspect and manage a disk payload cache", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). If omitted, the usual locations and defaults are used.")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Print a cached payload (or write it to --out)")]
    Get {
        uid: String,
        #[arg(long, help = "Write the payload to this file instead of stdout")]
        out: Option<PathBuf>,
    },
    #[command(about = "Store a file's bytes under a uid")]
    Put {
        uid: String,
        file: PathBuf,
        #[arg(long, help = "Entry lifetime in milliseconds (default 30 days)")]
        max_age_ms: Option<u64>,
        #[arg(long, help = "Store under the persistent base directory instead of the temporary one")]
        persistent: bool,
        #[arg(long, help = "Record a CRC-32 and verify it on every load")]
        checksum: bool,
    },
    #[command(about = "Remove one entry")]
    Evict { uid: String },
    #[command(about = "Delete every payload and the metadata file")]
    Clear,
    #[command(about = "Bytes of payload files on disk")]
    Size,
    #[command(about = "Prune missing, expired and corrupt entries")]
    Health,
    #[command(about = "Entry count, indexed bytes and limits")]
    Stats,
}

fn run(cli: Cli) -> diskcache::Result<bool> {
    let cfg = DiskCacheConfig::load(cli.config.as_deref())?;
    let cache = DiskCache::new(cfg)?;
    let ok = match cli.command {
        Commands::Get { uid, out } => match cache.try_load(&uid)? {
            Some(bytes) => {
                match out {
                    Some(p) => std::fs::write(p, &bytes)?,
                    None => std::io::stdout().write_all(&bytes)?,
                }
                true
            }
            None => {
                eprintln!("not cached: {uid}");
                false
            }
        },
        Commands::Put { uid, file, max_age_ms, persistent, checksum } => {
            let bytes = std::fs::read(&file)?;
            let mut rule = CacheRule::default().with_checksum(checksum);
            if let Some(ms) = max_age_ms {
                rule = rule.with_max_age(Duration::from_millis(ms));
            }
            if persistent {
                rule = rule.persistent();
            }
            cache.try_save(&uid, &bytes, rule)?;
            true
        }
        Commands::Evict { uid } => {
            cache.try_evict(&uid)?;
            true
        }
        Commands::Clear => {
            cache.try_clear()?;
            true
        }
        Commands::Size => {
            println!("{}", cache.cache_size_on_disk()?);
            true
        }
        Commands::Health => {
            let pruned = cache.try_keep_healthy()?;
            for (uid, defect) in &pruned {
                println!("pruned {uid}: {defect}");
            }
            println!("{} entries pruned, {} remain", pruned.len(), cache.entry_count());
            true
        }
        Commands::Stats => {
            let cfg = cache.config();
            println!("entries: {} / {}", cache.entry_count(), cfg.max_entries);
            println!("bytes:   {} / {}", cache.total_bytes(), cfg.max_size_bytes);
            println!("metadata: {}", cache.metadata_path().display());
            true
        }
    };
    Ok(ok)
}

fn main() -> ExitCode {
    if (std::env::var_os("DISKCACHE_LOG_DIR").is_some() || std::env::var_os("DISKCACHE_LOG_CONFIG").is_some())
        && let Err(e) = diskcache::init_logging()
    {
        eprintln!("logging disabled: {e}");
    }
    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
