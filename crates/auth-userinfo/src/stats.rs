//! Lookup counters
//!
//! Cache counters live in each [`auth_cache::Cache`]; these track what the
//! resolver asked of the [`UserSource`](crate::UserSource) on top of them.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct LookupCounters {
    requests: AtomicU64,
    queries: AtomicU64,
    errors: AtomicU64,
    missing: AtomicU64,
    query_ns: AtomicU64,
}

impl LookupCounters {
    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// One source query, its result kind and how long it took.
    pub(crate) fn record_query(&self, elapsed: Duration, missing: bool, failed: bool) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        } else if missing {
            self.missing.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.query_ns.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LookupStats {
        LookupStats {
            requests: self.requests.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
            query_time: Duration::from_nanos(self.query_ns.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time copy of one lookup kind's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupStats {
    /// Resolutions asked for, cached or not
    pub requests: u64,
    /// Resolutions that went to the source
    pub queries: u64,
    /// Source queries that failed
    pub errors: u64,
    /// Source queries for unknown keys
    pub missing: u64,
    /// Total time spent in source queries
    pub query_time: Duration,
}

impl LookupStats {
    /// Labelled counter values for metrics exporters. `query_time` is
    /// reported in nanoseconds.
    pub fn counters(&self) -> [(&'static str, u64); 5] {
        [
            ("requests", self.requests),
            ("queries", self.queries),
            ("query_errors", self.errors),
            ("query_missing", self.missing),
            (
                "query_time",
                u64::try_from(self.query_time.as_nanos()).unwrap_or(u64::MAX),
            ),
        ]
    }
}
