//! Cache counters
//!
//! Counters are written only by the engine loop and read by anyone, so a
//! metrics scrape never queues behind cache requests.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters shared between the engine loop and the cache handle.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    size: AtomicU64,
    gets: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    saves: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    delete_misses: AtomicU64,
    prunes: AtomicU64,
    pruned: AtomicU64,
    pruning_ns: AtomicU64,
}

impl Counters {
    pub(crate) fn record_get(&self, found: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_save(&self, existed: bool) {
        if existed {
            self.updates.fetch_add(1, Ordering::Relaxed);
        } else {
            self.saves.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_delete(&self, existed: bool) {
        if existed {
            self.deletes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.delete_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_sweep(&self, pruned: usize, elapsed: Duration) {
        self.prunes.fetch_add(1, Ordering::Relaxed);
        self.pruned.fetch_add(pruned as u64, Ordering::Relaxed);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.pruning_ns.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(crate) fn set_size(&self, size: usize) {
        self.size.store(size as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            size: self.size.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            delete_misses: self.delete_misses.load(Ordering::Relaxed),
            prunes: self.prunes.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            pruning: Duration::from_nanos(self.pruning_ns.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time copy of a cache's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently stored
    pub size: u64,
    pub gets: u64,
    pub hits: u64,
    pub misses: u64,
    /// Saves of keys that were not cached
    pub saves: u64,
    /// Saves that overwrote a cached key
    pub updates: u64,
    pub deletes: u64,
    pub delete_misses: u64,
    /// Sweeps run
    pub prunes: u64,
    /// Entries evicted by sweeps
    pub pruned: u64,
    /// Total time spent sweeping
    pub pruning: Duration,
}

impl CacheStats {
    /// Labelled counter values for metrics exporters. `pruning` is reported
    /// in nanoseconds.
    pub fn counters(&self) -> [(&'static str, u64); 11] {
        [
            ("size", self.size),
            ("gets", self.gets),
            ("hits", self.hits),
            ("misses", self.misses),
            ("saves", self.saves),
            ("updates", self.updates),
            ("deletes", self.deletes),
            ("delete_misses", self.delete_misses),
            ("pruned", self.pruned),
            ("prunes", self.prunes),
            (
                "pruning",
                u64::try_from(self.pruning.as_nanos()).unwrap_or(u64::MAX),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.gets, 0);
        assert_eq!(stats.pruning, Duration::ZERO);
    }

    #[test]
    fn test_record_get_splits_hits_and_misses() {
        let counters = Counters::default();
        counters.record_get(true);
        counters.record_get(false);
        counters.record_get(true);

        let stats = counters.snapshot();
        assert_eq!(stats.gets, 3);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_record_save_and_delete() {
        let counters = Counters::default();
        counters.record_save(false);
        counters.record_save(true);
        counters.record_delete(true);
        counters.record_delete(false);
        counters.record_delete(false);

        let stats = counters.snapshot();
        assert_eq!(stats.saves, 1);
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.delete_misses, 2);
    }

    #[test]
    fn test_record_sweep_accumulates() {
        let counters = Counters::default();
        counters.record_sweep(3, Duration::from_millis(2));
        counters.record_sweep(0, Duration::from_millis(1));
        counters.set_size(7);

        let stats = counters.snapshot();
        assert_eq!(stats.prunes, 2);
        assert_eq!(stats.pruned, 3);
        assert_eq!(stats.pruning, Duration::from_millis(3));
        assert_eq!(stats.size, 7);
    }

    #[test]
    fn test_counters_labels() {
        let stats = CacheStats {
            hits: 5,
            delete_misses: 2,
            pruning: Duration::from_micros(1),
            ..Default::default()
        };

        let counters = stats.counters();
        assert!(counters.contains(&("hits", 5)));
        assert!(counters.contains(&("delete_misses", 2)));
        assert!(counters.contains(&("pruning", 1_000)));
        assert_eq!(counters.len(), 11);
    }

    #[test]
    fn test_cache_stats_serialization() {
        let stats = CacheStats {
            size: 100,
            hits: 500,
            ..Default::default()
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"size\":100"));
        assert!(json.contains("\"hits\":500"));
        assert!(json.contains("delete_misses"));
    }
}
