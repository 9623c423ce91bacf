use crate::integration_tests::support::{payload, reopen, temp_cache};
use diskcache::{CacheRule, StoreDirectory};

#[test]
fn clear_removes_both_stores_and_metadata() {
    let (base, cache) = temp_cache(|c| c);
    assert!(cache.save("t", &payload(10, 1), CacheRule::default()));
    assert!(cache.save("p", &payload(10, 2), CacheRule::default().persistent()));
    assert_eq!(cache.cache_size_on_disk().unwrap(), 20);

    assert!(cache.clear());
    assert!(!cache.dirs().payload_dir(StoreDirectory::Temporary).exists());
    assert!(!cache.dirs().payload_dir(StoreDirectory::Persistent).exists());
    assert!(!cache.metadata_path().exists());
    assert!(!cache.is_initialized());
    assert_eq!(cache.cache_size_on_disk().unwrap(), 0);
    assert!(cache.load("t").is_none());
    assert!(cache.load("p").is_none());
    drop(cache);

    assert_eq!(reopen(&base, |c| c).entry_count(), 0);
}

#[test]
fn clear_deletes_unindexed_files_too() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("a", b"indexed", CacheRule::default()));
    let stray = cache.dirs().payload_path(StoreDirectory::Temporary, "stray");
    std::fs::write(&stray, b"orphan").unwrap();
    assert!(cache.clear());
    assert!(!stray.exists());
}

#[test]
fn clear_on_empty_cache_succeeds() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.clear());
    assert!(cache.clear());
}

#[test]
fn cache_is_usable_after_clear() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("a", b"before", CacheRule::default()));
    assert!(cache.clear());
    assert!(cache.save("a", b"after", CacheRule::default()));
    assert_eq!(cache.load("a").as_deref(), Some(&b"after"[..]));
    assert_eq!(cache.uids(), vec!["a"]);
}

#[test]
fn zero_byte_limit_clears_everything() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.save("a", &payload(16, 0), CacheRule::default()));
    assert!(cache.save("b", &payload(16, 0), CacheRule::default().persistent()));

    assert!(cache.set_max_size_bytes(0));
    assert_eq!(cache.max_size_bytes(), 0);
    assert!(cache.load("a").is_none());
    assert!(cache.load("b").is_none());
    assert_eq!(cache.cache_size_on_disk().unwrap(), 0);
    assert!(!cache.metadata_path().exists());
}

#[test]
fn zero_byte_limit_keeps_nothing_afterwards() {
    let (_base, cache) = temp_cache(|c| c);
    assert!(cache.set_max_size_bytes(0));
    assert!(cache.save("a", b"x", CacheRule::default()));
    assert!(!cache.contains("a"));
    assert_eq!(cache.cache_size_on_disk().unwrap(), 0);
}
