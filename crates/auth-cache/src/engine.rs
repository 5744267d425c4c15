//! The cache engine
//!
//! A [`Cache`] owns a single tokio task (the engine loop) that holds the
//! store. Every operation is a message on a bounded channel answered over a
//! oneshot, so the store is only ever touched by one task and needs no lock.

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::error::{CacheError, Result};
use crate::pruner::Pruner;
use crate::request::Request;
use crate::stats::{CacheStats, Counters};
use crate::store::{Expiry, Store};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// tokio channels cannot be unbuffered; one slot is the closest to a
/// rendezvous and keeps bursts of callers queued on the sender.
const REQUEST_BUFFER: usize = 1;

/// Handle to a running (or stopped) cache engine.
///
/// Share it by reference or inside an `Arc`; all operations take `&self`.
/// Operations on a stopped cache return [`CacheError::Stopped`].
pub struct Cache<V> {
    name: Arc<str>,
    counters: Arc<Counters>,
    state: RwLock<Option<Running<V>>>,
}

struct Running<V> {
    requests: mpsc::Sender<Request<V>>,
    engine: JoinHandle<Store<V>>,
    pruner: Option<Pruner>,
}

impl<V: Clone + Send + 'static> Cache<V> {
    /// Create a cache and start its engine. Must be called inside a tokio
    /// runtime.
    pub fn new(name: &str, config: CacheConfig) -> Self {
        let name: Arc<str> = Arc::from(name);
        let counters = Arc::new(Counters::default());
        let running = launch(name.clone(), counters.clone(), &config);

        Self {
            name,
            counters,
            state: RwLock::new(Some(running)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Start the engine with a fresh, empty store. Returns `false` and
    /// changes nothing if it is already running.
    pub async fn start(&self, config: CacheConfig) -> bool {
        let mut state = self.state.write().await;
        if state.is_some() {
            return false;
        }

        *state = Some(launch(self.name.clone(), self.counters.clone(), &config));
        true
    }

    /// Stop the engine and wait for its loop to exit.
    ///
    /// Requests already handed to the engine are answered before it exits;
    /// anything issued after this call starts gets [`CacheError::Stopped`].
    /// With `purge` the store is emptied entry by entry instead of being
    /// dropped wholesale. Stopping a stopped cache does nothing.
    ///
    /// The state lock is held until the loop has exited, so a concurrent
    /// [`start`](Self::start) waits for the old engine to finish.
    pub async fn stop(&self, purge: bool) {
        let mut state = self.state.write().await;
        let Some(running) = state.take() else {
            return;
        };

        if let Some(pruner) = running.pruner {
            pruner.stop().await;
        }

        // The loop ends once every sender clone (ours and those held by
        // in-flight callers) is gone and the queue is empty.
        drop(running.requests);

        match running.engine.await {
            Ok(mut store) => {
                if purge {
                    let purged = store.purge();
                    debug!(cache = %self.name, purged, "Purged cache entries");
                }
            }
            Err(e) => error!(cache = %self.name, error = %e, "Cache engine task failed"),
        }

        drop(state);
        info!(cache = %self.name, "Cache engine stopped");
    }

    /// Look up `key`, counting a hit. The returned entry is a copy
    /// reflecting this hit.
    pub async fn get(&self, key: &str) -> Result<Option<Entry<V>>> {
        let key = key.to_string();
        self.request(|reply| Request::Get { key, reply }).await
    }

    /// Insert or overwrite `key`. Returns whether the key was already cached.
    pub async fn save(&self, key: &str, data: V, volatile: bool) -> Result<bool> {
        let key = key.to_string();
        self.request(|reply| Request::Save {
            key,
            data,
            volatile,
            reply,
        })
        .await
    }

    /// Remove `key`, returning the removed entry if it was cached.
    pub async fn delete(&self, key: &str) -> Result<Option<Entry<V>>> {
        let key = key.to_string();
        self.request(|reply| Request::Delete { key, reply }).await
    }

    /// Delete several keys, one independent request per key. Results are in
    /// input order.
    pub async fn delete_many<I, K>(&self, keys: I) -> Result<Vec<Option<Entry<V>>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut removed = Vec::new();
        for key in keys {
            removed.push(self.delete(key.as_ref()).await?);
        }
        Ok(removed)
    }

    /// Copies of every cached entry. Hit counters are not touched.
    pub async fn list(&self) -> Result<HashMap<String, Entry<V>>> {
        self.request(|reply| Request::List { reply }).await
    }

    /// Run a sweep now, returning how many entries were evicted.
    pub async fn prune(&self) -> Result<usize> {
        self.request(|reply| Request::Sweep { reply }).await
    }

    /// Current counters, read without going through the engine.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request<V>) -> Result<T> {
        let requests = match self.state.read().await.as_ref() {
            Some(running) => running.requests.clone(),
            None => return Err(CacheError::Stopped),
        };

        let (reply, response) = oneshot::channel();
        requests
            .send(build(reply))
            .await
            .map_err(|_| CacheError::Stopped)?;
        response.await.map_err(|_| CacheError::Stopped)
    }
}

fn launch<V: Clone + Send + 'static>(
    name: Arc<str>,
    counters: Arc<Counters>,
    config: &CacheConfig,
) -> Running<V> {
    let (requests, inbox) = mpsc::channel(REQUEST_BUFFER);
    let engine = tokio::spawn(run(
        name.clone(),
        inbox,
        counters,
        Expiry::from(config),
        config.slow_sweep,
    ));

    let pruner = config.prune.then(|| {
        Pruner::spawn(
            name.clone(),
            requests.clone(),
            config.prune_interval,
            config.prune_jitter,
        )
    });

    info!(
        cache = %name,
        prune = config.prune,
        interval_secs = config.prune_interval.as_secs(),
        "Cache engine started"
    );

    Running {
        requests,
        engine,
        pruner,
    }
}

/// The engine loop. Handles one request at a time until every sender is
/// dropped, then hands the store back to `stop`.
async fn run<V: Clone>(
    name: Arc<str>,
    mut inbox: mpsc::Receiver<Request<V>>,
    counters: Arc<Counters>,
    expiry: Expiry,
    slow_sweep: Duration,
) -> Store<V> {
    let mut store = Store::new();
    counters.set_size(0);

    while let Some(request) = inbox.recv().await {
        // A caller that gave up waiting has dropped its receiver; the reply
        // is discarded but the operation still applies.
        match request {
            Request::Get { key, reply } => {
                let entry = store.get(&key, Utc::now());
                counters.record_get(entry.is_some());
                let _ = reply.send(entry);
            }
            Request::Save {
                key,
                data,
                volatile,
                reply,
            } => {
                let existed = store.save(key, data, volatile, Utc::now());
                counters.record_save(existed);
                let _ = reply.send(existed);
            }
            Request::Delete { key, reply } => {
                let removed = store.delete(&key);
                counters.record_delete(removed.is_some());
                let _ = reply.send(removed);
            }
            Request::List { reply } => {
                let _ = reply.send(store.snapshot());
            }
            Request::Sweep { reply } => {
                let started = Instant::now();
                let pruned = store.sweep(Utc::now(), &expiry);
                let elapsed = started.elapsed();
                counters.record_sweep(pruned, elapsed);

                if elapsed > slow_sweep {
                    warn!(
                        cache = %name,
                        pruned,
                        remaining = store.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Slow cache sweep"
                    );
                } else {
                    debug!(
                        cache = %name,
                        pruned,
                        remaining = store.len(),
                        elapsed_us = elapsed.as_micros() as u64,
                        "Cache sweep"
                    );
                }
                let _ = reply.send(pruned);
            }
        }

        counters.set_size(store.len());
    }

    // The store leaves the engine here; whatever `stop` does with it is no
    // longer cached.
    counters.set_size(0);
    store
}
