use diskcache::{CacheRule, DiskCache, DiskCacheConfig};
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
    Save(u8, usize),
    Load(u8),
    Evict(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..6, 0usize..48).prop_map(|(k, len)| Op::Save(k, len)),
        2 => (0u8..6).prop_map(Op::Load),
        1 => (0u8..6).prop_map(Op::Evict),
    ]
}

/// Reference LRU: oldest first, (uid, size).
struct Model {
    entries: VecDeque<(String, u64)>,
    max_entries: usize,
    max_bytes: u64,
}

impl Model {
    fn bytes(&self) -> u64 {
        self.entries.iter().map(|(_, s)| s).sum()
    }

    fn position(&self, uid: &str) -> Option<usize> {
        self.entries.iter().position(|(u, _)| u == uid)
    }

    fn save(&mut self, uid: String, size: u64) {
        if let Some(i) = self.position(&uid) {
            self.entries.remove(i);
        }
        self.entries.push_back((uid, size));
        while self.entries.len() > self.max_entries || self.bytes() > self.max_bytes {
            self.entries.pop_front();
        }
    }

    fn load(&mut self, uid: &str) -> bool {
        let Some(i) = self.position(uid) else { return false };
        if self.entries.len() >= self.max_entries || self.bytes() >= self.max_bytes {
            let hit = self.entries.remove(i).unwrap();
            self.entries.push_back(hit);
        }
        true
    }

    fn evict(&mut self, uid: &str) {
        if let Some(i) = self.position(uid) {
            self.entries.remove(i);
        }
    }

    fn uids(&self) -> Vec<String> {
        self.entries.iter().map(|(u, _)| u.clone()).collect()
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 24,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_cache_tracks_lru_model(
        max_entries in 1usize..5,
        max_bytes in 16u64..128,
        ops in proptest::collection::vec(op(), 1..40),
    ) {
        let base = tempfile::tempdir().unwrap();
        let cfg = DiskCacheConfig::with_base_dirs(base.path().join("t"), base.path().join("p"))
            .max_entries(max_entries)
            .max_size_bytes(max_bytes);
        let cache = DiskCache::new(cfg).unwrap();
        let mut model = Model { entries: VecDeque::new(), max_entries, max_bytes };

        for op in ops {
            match op {
                Op::Save(k, len) => {
                    let uid = format!("k{k}");
                    prop_assert!(cache.save(&uid, &vec![k; len], CacheRule::default()));
                    model.save(uid, len as u64);
                }
                Op::Load(k) => {
                    let uid = format!("k{k}");
                    let got = cache.load(&uid);
                    prop_assert_eq!(got.is_some(), model.load(&uid));
                    if let Some(bytes) = got {
                        prop_assert!(bytes.iter().all(|b| *b == k));
                    }
                }
                Op::Evict(k) => {
                    let uid = format!("k{k}");
                    prop_assert!(cache.evict(&uid));
                    model.evict(&uid);
                }
            }
            prop_assert!(cache.entry_count() <= max_entries);
            prop_assert!(cache.total_bytes() <= max_bytes);
            prop_assert_eq!(cache.uids(), model.uids());
        }
        prop_assert_eq!(cache.cache_size_on_disk().unwrap(), model.bytes());
    }

    #[test]
    fn prop_index_survives_restart(
        sizes in proptest::collection::vec(0usize..32, 1..12),
    ) {
        let base = tempfile::tempdir().unwrap();
        let cfg = || DiskCacheConfig::with_base_dirs(base.path().join("t"), base.path().join("p")).max_entries(5);
        let cache = DiskCache::new(cfg()).unwrap();
        for (i, len) in sizes.iter().enumerate() {
            let uid = format!("u{i}");
            prop_assert!(cache.save(&uid, &vec![0u8; *len], CacheRule::default()));
        }
        let before = cache.uids();
        drop(cache);
        let restarted = DiskCache::new(cfg()).unwrap();
        prop_assert_eq!(restarted.uids(), before);
        prop_assert_eq!(restarted.total_bytes(), restarted.cache_size_on_disk().unwrap());
    }
}
