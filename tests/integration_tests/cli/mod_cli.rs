use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_config(base: &Path, extra: &str) -> std::path::PathBuf {
    let cfg = base.join("diskcache.toml");
    let body = format!(
        "temporary_dir = {:?}\npersistent_dir = {:?}\n{extra}",
        base.join("temporary").display().to_string(),
        base.join("persistent").display().to_string(),
    );
    std::fs::write(&cfg, body).unwrap();
    cfg
}

fn cli(base: &TempDir, args: &[&str]) -> Output {
    let cfg = base.path().join("diskcache.toml");
    Command::new(env!("CARGO_BIN_EXE_diskcache"))
        .arg("--config")
        .arg(&cfg)
        .args(args)
        .env_remove("DISKCACHE_LOG_DIR")
        .env_remove("DISKCACHE_LOG_CONFIG")
        .env_remove("DISKCACHE_TEMP_DIR")
        .env_remove("DISKCACHE_PERSISTENT_DIR")
        .env_remove("DISKCACHE_MAX_ENTRIES")
        .env_remove("DISKCACHE_MAX_SIZE_BYTES")
        .output()
        .expect("run diskcache")
}

#[test]
fn put_get_size_evict() {
    let base = tempfile::tempdir().unwrap();
    write_config(base.path(), "");
    let input = base.path().join("in.bin");
    std::fs::write(&input, b"hello cache").unwrap();

    assert!(cli(&base, &["put", "greeting", input.to_str().unwrap(), "--checksum"]).status.success());

    let got = cli(&base, &["get", "greeting"]);
    assert!(got.status.success());
    assert_eq!(got.stdout, b"hello cache");

    let size = cli(&base, &["size"]);
    assert_eq!(String::from_utf8_lossy(&size.stdout).trim(), "11");

    assert!(cli(&base, &["evict", "greeting"]).status.success());
    let miss = cli(&base, &["get", "greeting"]);
    assert!(!miss.status.success());
    assert!(String::from_utf8_lossy(&miss.stderr).contains("not cached"));
}

#[test]
fn config_limits_apply_to_cli_saves() {
    let base = tempfile::tempdir().unwrap();
    write_config(base.path(), "max_entries = 1\n");
    let input = base.path().join("in.bin");
    std::fs::write(&input, b"x").unwrap();

    assert!(cli(&base, &["put", "a", input.to_str().unwrap()]).status.success());
    assert!(cli(&base, &["put", "b", input.to_str().unwrap(), "--persistent"]).status.success());
    let stats = String::from_utf8_lossy(&cli(&base, &["stats"]).stdout).into_owned();
    assert!(stats.contains("entries: 1 / 1"), "{stats}");
    assert!(!cli(&base, &["get", "a"]).status.success());
}

#[test]
fn health_and_clear() {
    let base = tempfile::tempdir().unwrap();
    write_config(base.path(), "");
    let input = base.path().join("in.bin");
    std::fs::write(&input, b"short lived").unwrap();

    assert!(cli(&base, &["put", "gone", input.to_str().unwrap(), "--max-age-ms", "0"]).status.success());
    std::thread::sleep(std::time::Duration::from_millis(5));
    let health = String::from_utf8_lossy(&cli(&base, &["health"]).stdout).into_owned();
    assert!(health.contains("pruned gone: expired"), "{health}");

    assert!(cli(&base, &["put", "kept", input.to_str().unwrap()]).status.success());
    assert!(cli(&base, &["clear"]).status.success());
    let size = cli(&base, &["size"]);
    assert_eq!(String::from_utf8_lossy(&size.stdout).trim(), "0");
}

#[test]
fn malformed_config_is_an_error() {
    let base = tempfile::tempdir().unwrap();
    std::fs::write(base.path().join("diskcache.toml"), "max_entries = \"many\"").unwrap();
    let out = cli(&base, &["size"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("error:"));
}
