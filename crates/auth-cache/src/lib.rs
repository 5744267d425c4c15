//! Single-writer authorization cache
//!
//! A key → value cache whose store is owned by one tokio task. Callers talk
//! to it over a channel, so gets, saves, deletes and sweeps are applied one
//! at a time without locks. Volatile entries (negative or unconfirmed
//! lookups) expire after a short idle window; confirmed entries after a long
//! one. An optional background pruner sweeps expired entries.

mod config;
mod engine;
mod entry;
mod error;
mod pruner;
mod request;
mod stats;
mod store;

pub use config::CacheConfig;
pub use engine::Cache;
pub use entry::Entry;
pub use error::{CacheError, Result};
pub use stats::CacheStats;
