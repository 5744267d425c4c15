//! API key and server identity resolution
//!
//! Maps API keys and server IDs to the user and environment they belong to.
//! Answers come from an [`auth_cache::Cache`] per key kind; misses go to a
//! [`UserSource`] and the result is cached (briefly, for unknown keys).

mod config;
mod error;
mod resolver;
mod source;
mod stats;
mod types;

pub use auth_cache::{CacheConfig, CacheStats, Entry};
pub use config::ResolverConfig;
pub use error::{Result, UserInfoError};
pub use resolver::{Outcome, Resolution, Resolver, ResolverStats};
pub use source::UserSource;
pub use stats::LookupStats;
pub use types::{mask_api_key, UserInfo, DEFAULT_ENVIRONMENT, DEFAULT_USERNAME, DEFAULT_USER_ID};
