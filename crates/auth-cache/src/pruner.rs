//! Background sweep scheduling
//!
//! The pruner owns no cache state. On every tick it sends a sweep request
//! through the engine's request channel, so sweeps are serialized with
//! ordinary gets and saves.

use crate::request::Request;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub(crate) struct Pruner {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Pruner {
    pub(crate) fn spawn<V: Send + 'static>(
        name: Arc<str>,
        requests: mpsc::Sender<Request<V>>,
        interval: Duration,
        jitter: Duration,
    ) -> Self {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(name, requests, interval, jitter, shutdown_rx));
        Self { shutdown, task }
    }

    /// Signal the pruner and wait for it to exit. A sweep already sent to the
    /// engine completes first.
    pub(crate) async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "Pruner task ended abnormally");
        }
    }
}

async fn run<V>(
    name: Arc<str>,
    requests: mpsc::Sender<Request<V>>,
    interval: Duration,
    jitter: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let wait = next_wait(interval, jitter);

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(wait) => {}
        }

        let (reply, pruned) = oneshot::channel();
        if requests.send(Request::Sweep { reply }).await.is_err() {
            break;
        }

        match pruned.await {
            Ok(count) => debug!(cache = %name, pruned = count, "Scheduled sweep finished"),
            Err(_) => break,
        }
    }

    debug!(cache = %name, "Pruner exited");
}

/// Interval plus a fresh random delay in `[0, jitter)`, so caches created
/// together do not sweep in lockstep.
fn next_wait(interval: Duration, jitter: Duration) -> Duration {
    let max_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return interval;
    }

    interval + Duration::from_millis(rand::rng().random_range(0..max_ms))
}
