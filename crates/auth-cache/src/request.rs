//! Messages accepted by the engine loop

use crate::entry::Entry;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// One unit of work for the engine. Each variant carries the sender the
/// engine answers on exactly once.
#[derive(Debug)]
pub(crate) enum Request<V> {
    Get {
        key: String,
        reply: oneshot::Sender<Option<Entry<V>>>,
    },
    Save {
        key: String,
        data: V,
        volatile: bool,
        reply: oneshot::Sender<bool>,
    },
    Delete {
        key: String,
        reply: oneshot::Sender<Option<Entry<V>>>,
    },
    List {
        reply: oneshot::Sender<HashMap<String, Entry<V>>>,
    },
    /// Evict expired entries; answers with the number removed
    Sweep { reply: oneshot::Sender<usize> },
}
