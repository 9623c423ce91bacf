use crate::integration_tests::support::{payload, reopen, temp_cache};
use diskcache::{CacheRule, Defect};
use std::thread::sleep;
use std::time::Duration;

fn expiring() -> CacheRule {
    CacheRule::default().with_max_age(Duration::ZERO)
}

#[test]
fn externally_deleted_payload_is_dropped_on_load() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("a", &payload(30, 0), CacheRule::default()));
    assert!(cache.save("b", &payload(20, 0), CacheRule::default()));
    assert_eq!(cache.cache_size_on_disk().unwrap(), 50);

    std::fs::remove_file(cache.entry("a").unwrap().path).unwrap();
    assert_eq!(cache.cache_size_on_disk().unwrap(), 20);
    assert!(cache.load("a").is_none());
    assert!(!cache.contains("a"));
    assert_eq!(cache.entry_count(), 1);
    assert_eq!(cache.metrics_snapshot().repairs, 1);
}

#[test]
fn expired_entry_is_absent_and_deleted() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("old", b"stale bytes", expiring()));
    let path = cache.entry("old").unwrap().path;
    sleep(Duration::from_millis(5));
    assert!(cache.load("old").is_none());
    assert!(!path.exists());
    assert!(!cache.contains("old"));
}

#[test]
fn checksum_mismatch_is_absent_and_deleted() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("img", b"original", CacheRule::default().with_checksum(true)));
    let path = cache.entry("img").unwrap().path;
    std::fs::write(&path, b"bitrot!!").unwrap();
    assert!(cache.load("img").is_none());
    assert!(!path.exists());
    assert!(!cache.contains("img"));
}

#[test]
fn modified_payload_without_checksum_is_served() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("img", b"original", CacheRule::default()));
    std::fs::write(cache.entry("img").unwrap().path, b"replaced").unwrap();
    assert_eq!(cache.load("img").as_deref(), Some(&b"replaced"[..]));
}

#[test]
fn health_pass_prunes_every_defect_kind() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("good", b"fine", CacheRule::default().with_checksum(true)));
    assert!(cache.save("gone", b"soon missing", CacheRule::default()));
    assert!(cache.save("old", b"expiring", expiring()));
    assert!(cache.save("rot", b"original", CacheRule::default().with_checksum(true)));
    std::fs::remove_file(cache.entry("gone").unwrap().path).unwrap();
    std::fs::write(cache.entry("rot").unwrap().path, b"tampered").unwrap();
    let old_path = cache.entry("old").unwrap().path;
    let rot_path = cache.entry("rot").unwrap().path;
    sleep(Duration::from_millis(5));

    let mut pruned = cache.try_keep_healthy().unwrap();
    pruned.sort();
    let mut expected = vec![
        ("gone".to_string(), Defect::Missing),
        ("old".to_string(), Defect::Expired),
        ("rot".to_string(), Defect::ChecksumMismatch),
    ];
    expected.sort();
    assert_eq!(pruned, expected);
    assert_eq!(cache.uids(), vec!["good"]);
    assert!(!old_path.exists());
    assert!(!rot_path.exists());
    assert_eq!(cache.cache_size_on_disk().unwrap(), 4);
}

#[test]
fn health_pass_persists_repairs() {
    let (base, cache) = temp_cache(|c| c);
    assert!(cache.save("a", b"1", CacheRule::default()));
    assert!(cache.save("b", b"2", CacheRule::default()));
    std::fs::remove_file(cache.entry("a").unwrap().path).unwrap();
    assert!(cache.keep_healthy());
    drop(cache);

    let restarted = reopen(&base, |c| c);
    assert_eq!(restarted.uids(), vec!["b"]);
}

#[test]
fn health_pass_reenforces_capacity_for_loaded_index() {
    let (base, cache) = temp_cache(|c| c.max_entries(4));
    for uid in ["a", "b", "c", "d"] {
        assert!(cache.save(uid, b"x", CacheRule::default()));
    }
    drop(cache);

    let tighter = reopen(&base, |c| c.max_entries(2));
    assert_eq!(tighter.entry_count(), 4);
    assert!(tighter.try_keep_healthy().unwrap().is_empty());
    assert_eq!(tighter.uids(), vec!["c", "d"]);
    assert_eq!(tighter.cache_size_on_disk().unwrap(), 2);
}

#[test]
fn drift_after_restart_heals_lazily() {
    let (base, cache) = temp_cache(|c| c);
    assert!(cache.save("a", b"payload", CacheRule::default()));
    let path = cache.entry("a").unwrap().path;
    drop(cache);
    std::fs::remove_file(path).unwrap();

    let restarted = reopen(&base, |c| c);
    assert!(restarted.contains("a"));
    assert!(restarted.load("a").is_none());
    assert!(!restarted.contains("a"));
}

#[test]
fn health_pass_sweeps_interrupted_writes() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("a", b"kept", CacheRule::default()));
    for store in [diskcache::StoreDirectory::Temporary, diskcache::StoreDirectory::Persistent] {
        let dir = cache.dirs().payload_dir(store);
        std::fs::create_dir_all(&dir).unwrap();
        let stray = dir.join(format!("{}crash", diskcache::utils::fsutil::STAGING_PREFIX));
        std::fs::write(stray, b"half written").unwrap();
    }
    assert_eq!(cache.cache_size_on_disk().unwrap(), 4 + 2 * 12);

    assert!(cache.try_keep_healthy().unwrap().is_empty());
    assert_eq!(cache.cache_size_on_disk().unwrap(), 4);
    assert_eq!(cache.load("a").as_deref(), Some(&b"kept"[..]));
}
