//! The key → entry mapping owned by the engine loop

use crate::config::CacheConfig;
use crate::entry::Entry;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Eviction thresholds applied by a sweep
#[derive(Debug, Clone, Copy)]
pub(crate) struct Expiry {
    pub(crate) volatile_expire: Duration,
    pub(crate) max_unused: Duration,
}

impl Expiry {
    fn is_expired<V>(&self, entry: &Entry<V>, now: DateTime<Utc>) -> bool {
        let idle = entry.idle_at(now);
        idle > self.max_unused || (entry.volatile && idle > self.volatile_expire)
    }
}

impl From<&CacheConfig> for Expiry {
    fn from(config: &CacheConfig) -> Self {
        Self {
            volatile_expire: config.volatile_expire,
            max_unused: config.max_unused,
        }
    }
}

/// Never shared: only the engine loop holds one.
pub(crate) struct Store<V> {
    entries: HashMap<String, Entry<V>>,
}

impl<V: Clone> Store<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Count a hit on `key` and return a copy of the updated entry
    pub(crate) fn get(&mut self, key: &str, now: DateTime<Utc>) -> Option<Entry<V>> {
        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        Some(entry.clone())
    }

    /// Insert or overwrite. An overwrite starts a fresh entry: creation time,
    /// last access and hit count are all reset.
    pub(crate) fn save(&mut self, key: String, data: V, volatile: bool, now: DateTime<Utc>) -> bool {
        self.entries
            .insert(key, Entry::new(data, volatile, now))
            .is_some()
    }

    pub(crate) fn delete(&mut self, key: &str) -> Option<Entry<V>> {
        self.entries.remove(key)
    }

    /// Copies of every entry; hit counters are left alone.
    pub(crate) fn snapshot(&self) -> HashMap<String, Entry<V>> {
        self.entries.clone()
    }

    /// Evict every expired entry, returning how many were removed.
    ///
    /// This walks the whole map in one engine turn, so callers queue behind
    /// it for O(entries). Stores expected to hold far more than a few hundred
    /// thousand keys should split the walk across several turns.
    pub(crate) fn sweep(&mut self, now: DateTime<Utc>, expiry: &Expiry) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !expiry.is_expired(entry, now));
        before - self.entries.len()
    }

    /// Drop every entry individually so the map's memory is released now.
    pub(crate) fn purge(&mut self) -> usize {
        let purged = self.entries.drain().count();
        self.entries.shrink_to_fit();
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn expiry() -> Expiry {
        Expiry::from(&CacheConfig::default())
    }

    #[test]
    fn test_get_touches_and_copies() {
        let now = Utc::now();
        let mut store = Store::new();
        store.save("abc".to_string(), vec![1, 2, 3], false, now);

        let mut copy = store.get("abc", now).unwrap();
        assert_eq!(copy.hits, 1);
        copy.data.push(4);
        copy.hits = 99;

        let again = store.get("abc", now).unwrap();
        assert_eq!(again.data, vec![1, 2, 3]);
        assert_eq!(again.hits, 2);
    }

    #[test]
    fn test_get_missing() {
        let mut store: Store<u8> = Store::new();
        assert!(store.get("nope", Utc::now()).is_none());
    }

    #[test]
    fn test_save_reports_existing_and_resets() {
        let now = Utc::now();
        let mut store = Store::new();
        assert!(!store.save("k".to_string(), "v1", true, now));
        store.get("k", now);
        store.get("k", now);

        let later = now + TimeDelta::seconds(10);
        assert!(store.save("k".to_string(), "v2", false, later));

        let snapshot = store.snapshot();
        let entry = &snapshot["k"];
        assert_eq!(entry.data, "v2");
        assert_eq!(entry.hits, 0);
        assert_eq!(entry.created, later);
        assert!(!entry.volatile);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let now = Utc::now();
        let mut store = Store::new();
        store.save("k".to_string(), 7, false, now);

        assert_eq!(store.delete("k").map(|e| e.data), Some(7));
        assert!(store.delete("k").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_snapshot_does_not_count_hits() {
        let now = Utc::now();
        let mut store = Store::new();
        store.save("k".to_string(), 1, false, now);
        store.snapshot();
        store.snapshot();

        assert_eq!(store.get("k", now).unwrap().hits, 1);
    }

    #[test]
    fn test_sweep_evicts_idle_volatile_only() {
        let t0 = Utc::now();
        let mut store = Store::new();
        store.save("xyz".to_string(), None, true, t0);
        store.save("abc".to_string(), Some("live"), false, t0);

        let pruned = store.sweep(t0 + TimeDelta::minutes(16), &expiry());
        assert_eq!(pruned, 1);
        assert!(store.get("xyz", t0).is_none());
        assert!(store.get("abc", t0).is_some());
    }

    #[test]
    fn test_sweep_keeps_recently_read_volatile() {
        let t0 = Utc::now();
        let mut store = Store::new();
        store.save("xyz".to_string(), 0, true, t0);
        store.get("xyz", t0 + TimeDelta::minutes(10));

        assert_eq!(store.sweep(t0 + TimeDelta::minutes(16), &expiry()), 0);
        assert_eq!(store.sweep(t0 + TimeDelta::minutes(26), &expiry()), 1);
    }

    #[test]
    fn test_sweep_evicts_everything_past_max_unused() {
        let t0 = Utc::now();
        let mut store = Store::new();
        store.save("a".to_string(), 1, false, t0);
        store.save("b".to_string(), 2, true, t0);

        assert_eq!(store.sweep(t0 + TimeDelta::hours(24), &expiry()), 1);
        assert_eq!(store.sweep(t0 + TimeDelta::hours(26), &expiry()), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_sweep_boundary_is_exclusive() {
        let t0 = Utc::now();
        let mut store = Store::new();
        store.save("v".to_string(), 1, true, t0);

        assert_eq!(store.sweep(t0 + TimeDelta::minutes(15), &expiry()), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_purge() {
        let now = Utc::now();
        let mut store = Store::new();
        for i in 0..10 {
            store.save(format!("k{i}"), i, i % 2 == 0, now);
        }

        assert_eq!(store.purge(), 10);
        assert_eq!(store.len(), 0);
        assert!(store.snapshot().is_empty());
    }
}
