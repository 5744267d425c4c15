//! Cached entries and their access bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value plus bookkeeping.
///
/// Entries handed out by [`Cache`](crate::Cache) are owned copies taken inside
/// the engine loop. Mutating one never reaches the live store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<V> {
    pub data: V,
    /// Set once when the entry was saved
    pub created: DateTime<Utc>,
    /// Bumped by every successful get
    pub last_access: DateTime<Utc>,
    pub hits: u64,
    /// Volatile entries expire after the short idle window
    pub volatile: bool,
}

impl<V> Entry<V> {
    pub(crate) fn new(data: V, volatile: bool, now: DateTime<Utc>) -> Self {
        Self {
            data,
            created: now,
            last_access: now,
            hits: 0,
            volatile,
        }
    }

    /// Record a read. `last_access` never moves backwards, even if the wall
    /// clock does.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.hits += 1;
        if now > self.last_access {
            self.last_access = now;
        }
    }

    /// Time since the entry was saved
    pub fn age(&self) -> Duration {
        elapsed(self.created, Utc::now())
    }

    /// Time since the entry was last read (or saved, if never read)
    pub fn idle(&self) -> Duration {
        self.idle_at(Utc::now())
    }

    pub(crate) fn idle_at(&self, now: DateTime<Utc>) -> Duration {
        elapsed(self.last_access, now)
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_new_entry() {
        let now = Utc::now();
        let entry = Entry::new("live", true, now);
        assert_eq!(entry.created, now);
        assert_eq!(entry.last_access, now);
        assert_eq!(entry.hits, 0);
        assert!(entry.volatile);
    }

    #[test]
    fn test_touch_counts_and_moves_forward() {
        let now = Utc::now();
        let mut entry = Entry::new(1u32, false, now);

        let later = now + TimeDelta::seconds(5);
        entry.touch(later);
        entry.touch(later);
        assert_eq!(entry.hits, 2);
        assert_eq!(entry.last_access, later);
    }

    #[test]
    fn test_touch_never_rewinds_last_access() {
        let now = Utc::now();
        let mut entry = Entry::new(1u32, false, now);

        entry.touch(now - TimeDelta::seconds(30));
        assert_eq!(entry.hits, 1);
        assert_eq!(entry.last_access, now);
        assert!(entry.last_access >= entry.created);
    }

    #[test]
    fn test_idle_at() {
        let now = Utc::now();
        let entry = Entry::new((), false, now);

        assert_eq!(
            entry.idle_at(now + TimeDelta::minutes(16)),
            Duration::from_secs(16 * 60)
        );
        // A clock behind the entry reads as zero idle time.
        assert_eq!(entry.idle_at(now - TimeDelta::minutes(1)), Duration::ZERO);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = Entry::new("dev".to_string(), false, Utc::now());

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"data\":\"dev\""));
        assert!(json.contains("\"volatile\":false"));

        let deserialized: Entry<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, entry);
    }
}
