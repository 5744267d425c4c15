use std::collections::HashMap;
use std::time::{Duration, Instant};

use auth_cache::{Cache, CacheStats, Entry};
use serde::Serialize;
use tracing::{debug, error};

use crate::config::ResolverConfig;
use crate::error::Result;
use crate::source::UserSource;
use crate::stats::{LookupCounters, LookupStats};
use crate::types::{mask_api_key, UserInfo};

/// What a lookup concluded about a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// A real user owns the key
    Found,
    /// The source does not know the key (possibly remembered from cache)
    Missing,
    /// The source failed; nothing was cached
    Failed,
}

/// Answer for a single API key or server ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub user: UserInfo,
    /// How long the answer has been cached; zero for fresh lookups
    pub age: Duration,
    pub cached: bool,
    pub outcome: Outcome,
}

impl Resolution {
    /// Only a key owned by a real user is authorized. A failed lookup is
    /// refused even though it carries the default user, rather than passed
    /// through as the default environment.
    pub fn authorized(&self) -> bool {
        self.outcome == Outcome::Found
    }
}

/// Counters for both caches and the source lookups behind them
#[derive(Debug, Clone, Serialize)]
pub struct ResolverStats {
    pub users: CacheStats,
    pub servers: CacheStats,
    pub user_lookups: LookupStats,
    pub server_lookups: LookupStats,
}

#[derive(Debug, Clone, Copy)]
enum Lookup {
    User,
    Server,
}

impl Lookup {
    fn label(self) -> &'static str {
        match self {
            Lookup::User => "users",
            Lookup::Server => "servers",
        }
    }
}

/// Cache-aside resolver: answers from cache, falls back to the source on a
/// miss and caches what it learns. Unknown keys are cached as volatile
/// entries; source failures are never cached.
pub struct Resolver<S> {
    source: S,
    config: ResolverConfig,
    users: Cache<UserInfo>,
    servers: Cache<UserInfo>,
    user_lookups: LookupCounters,
    server_lookups: LookupCounters,
}

impl<S: UserSource> Resolver<S> {
    /// Create a resolver and start both caches. Must be called inside a tokio
    /// runtime.
    pub fn new(source: S, config: ResolverConfig) -> Self {
        let users = Cache::new(Lookup::User.label(), config.users.clone());
        let servers = Cache::new(Lookup::Server.label(), config.servers.clone());

        Self {
            source,
            config,
            users,
            servers,
            user_lookups: LookupCounters::default(),
            server_lookups: LookupCounters::default(),
        }
    }

    /// Resolve an API key
    pub async fn resolve_key(&self, api_key: &str) -> Result<Resolution> {
        self.resolve(Lookup::User, api_key).await
    }

    /// Resolve a server ID
    pub async fn resolve_server(&self, server_id: &str) -> Result<Resolution> {
        self.resolve(Lookup::Server, server_id).await
    }

    async fn resolve(&self, lookup: Lookup, key: &str) -> Result<Resolution> {
        let cache = self.cache(lookup);
        let counters = self.lookups(lookup);
        counters.record_request();

        if let Some(entry) = cache.get(key).await? {
            let outcome = if entry.data.is_default() {
                Outcome::Missing
            } else {
                Outcome::Found
            };

            return Ok(Resolution {
                age: entry.age(),
                user: entry.data,
                cached: true,
                outcome,
            });
        }

        let started = Instant::now();
        let fetched = match lookup {
            Lookup::User => self.source.user_by_key(key).await,
            Lookup::Server => self.source.user_by_server(key).await,
        };
        counters.record_query(
            started.elapsed(),
            matches!(fetched, Ok(None)),
            fetched.is_err(),
        );

        let (user, outcome) = match fetched {
            Ok(Some(user)) => {
                cache.save(key, user.clone(), false).await?;
                (user, Outcome::Found)
            }
            Ok(None) => {
                let mut user = UserInfo::default_user();
                if let Lookup::User = lookup {
                    user.api_key = key.to_string();
                }

                cache.save(key, user.clone(), true).await?;
                let (masked, length) = mask_api_key(key);
                debug!(cache = lookup.label(), key = %masked, length, "Caching unknown key");
                (user, Outcome::Missing)
            }
            Err(e) => {
                let (masked, length) = mask_api_key(key);
                error!(
                    cache = lookup.label(),
                    key = %masked,
                    length,
                    error = %e,
                    "Identity lookup failed"
                );
                (UserInfo::default_user(), Outcome::Failed)
            }
        };

        Ok(Resolution {
            user,
            age: Duration::ZERO,
            cached: false,
            outcome,
        })
    }

    /// Forget several API keys, returning what was cached for each.
    pub async fn delete_keys<I, K>(&self, api_keys: I) -> Result<Vec<Option<Entry<UserInfo>>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Ok(self.users.delete_many(api_keys).await?)
    }

    /// Forget a server ID, returning what was cached for it.
    pub async fn delete_server(&self, server_id: &str) -> Result<Option<Entry<UserInfo>>> {
        Ok(self.servers.delete(server_id).await?)
    }

    pub async fn list_users(&self) -> Result<HashMap<String, Entry<UserInfo>>> {
        Ok(self.users.list().await?)
    }

    pub async fn list_servers(&self) -> Result<HashMap<String, Entry<UserInfo>>> {
        Ok(self.servers.list().await?)
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            users: self.users.stats(),
            servers: self.servers.stats(),
            user_lookups: self.user_lookups.snapshot(),
            server_lookups: self.server_lookups.snapshot(),
        }
    }

    /// Restart both caches (empty) with the configured settings. Caches that
    /// are already running are left alone.
    pub async fn start(&self) {
        self.users.start(self.config.users.clone()).await;
        self.servers.start(self.config.servers.clone()).await;
    }

    /// Stop both caches. See [`Cache::stop`].
    pub async fn stop(&self, purge: bool) {
        self.users.stop(purge).await;
        self.servers.stop(purge).await;
    }

    fn cache(&self, lookup: Lookup) -> &Cache<UserInfo> {
        match lookup {
            Lookup::User => &self.users,
            Lookup::Server => &self.servers,
        }
    }

    fn lookups(&self, lookup: Lookup) -> &LookupCounters {
        match lookup {
            Lookup::User => &self.user_lookups,
            Lookup::Server => &self.server_lookups,
        }
    }
}
