//! Engine and pruner configuration

use std::env;
use std::time::Duration;

const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(3 * 60);
const DEFAULT_PRUNE_JITTER: Duration = Duration::from_secs(30);
const DEFAULT_VOLATILE_EXPIRE: Duration = Duration::from_secs(15 * 60);
const DEFAULT_MAX_UNUSED: Duration = Duration::from_secs(25 * 60 * 60);
const DEFAULT_SLOW_SWEEP: Duration = Duration::from_millis(100);

/// Configuration passed to [`Cache::start`](crate::Cache::start)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Run the background pruner. Without it entries only leave by delete,
    /// an explicit prune, or stop.
    pub prune: bool,
    /// Base time between sweeps
    pub prune_interval: Duration,
    /// Upper bound (exclusive) of the random delay added to every interval
    pub prune_jitter: Duration,
    /// Idle time after which a volatile entry is evicted
    pub volatile_expire: Duration,
    /// Idle time after which any entry is evicted
    pub max_unused: Duration,
    /// Sweeps slower than this are logged as warnings
    pub slow_sweep: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prune: false,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
            prune_jitter: DEFAULT_PRUNE_JITTER,
            volatile_expire: DEFAULT_VOLATILE_EXPIRE,
            max_unused: DEFAULT_MAX_UNUSED,
            slow_sweep: DEFAULT_SLOW_SWEEP,
        }
    }
}

impl CacheConfig {
    /// Default configuration with the background pruner enabled
    pub fn pruning() -> Self {
        Self {
            prune: true,
            ..Default::default()
        }
    }

    /// Parse configuration from `{prefix}_*` environment variables, starting
    /// from `base` for anything unset or unparsable.
    ///
    /// Recognized: `PRUNE`, `PRUNE_INTERVAL_SECS`, `PRUNE_JITTER_SECS`,
    /// `VOLATILE_EXPIRE_SECS`, `MAX_UNUSED_SECS`.
    pub fn from_env(prefix: &str, base: CacheConfig) -> Self {
        let prune = env::var(format!("{prefix}_PRUNE"))
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(base.prune);

        Self {
            prune,
            prune_interval: env_secs(prefix, "PRUNE_INTERVAL_SECS").unwrap_or(base.prune_interval),
            prune_jitter: env_secs(prefix, "PRUNE_JITTER_SECS").unwrap_or(base.prune_jitter),
            volatile_expire: env_secs(prefix, "VOLATILE_EXPIRE_SECS")
                .unwrap_or(base.volatile_expire),
            max_unused: env_secs(prefix, "MAX_UNUSED_SECS").unwrap_or(base.max_unused),
            slow_sweep: base.slow_sweep,
        }
    }
}

fn env_secs(prefix: &str, name: &str) -> Option<Duration> {
    env::var(format!("{prefix}_{name}"))
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
