use auth_cache::CacheConfig;

/// Cache settings for a [`Resolver`](crate::Resolver)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// API key cache. Pruned in the background: unknown keys are cached as
    /// volatile entries and must age out.
    pub users: CacheConfig,
    /// Server ID cache. Not pruned by default.
    pub servers: CacheConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            users: CacheConfig::pruning(),
            servers: CacheConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Parse configuration from `AP_USERS_*` and `AP_SERVERS_*` environment
    /// variables, see [`CacheConfig::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            users: CacheConfig::from_env("AP_USERS", defaults.users),
            servers: CacheConfig::from_env("AP_SERVERS", defaults.servers),
        }
    }
}
