//! Coordination service seam, used purely as a broadcast/invalidation bus.

use crate::error::Result;
use log::trace;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback for changes under a subscribed path.
pub trait CoordinationWatcher: Send + Sync {
    /// A node was created at `node_path` carrying `data`.
    fn on_change(&self, node_path: &str, data: &[u8]);
}

/// Watch/ephemeral-node style notification service shared by graph processes.
pub trait CoordinationService: Send + Sync {
    /// Create an ephemeral, auto-numbered node under `path` and notify watchers of
    /// that path. Returns the created node path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Coordination`] if the node cannot be created.
    fn create_ephemeral_sequential(&self, path: &str, data: &[u8]) -> Result<String>;

    /// Deliver changes under `path` to `watcher` until the watcher is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Coordination`] if the subscription fails.
    fn subscribe(&self, path: &str, watcher: Arc<dyn CoordinationWatcher>) -> Result<()>;
}

struct Subscription {
    path: String,
    watcher: Weak<dyn CoordinationWatcher>,
}

impl Subscription {
    /// Whether `node_path` is the subscribed path or a node beneath it.
    fn covers(&self, node_path: &str) -> bool {
        match node_path.strip_prefix(self.path.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Default)]
struct CoordinatorInner {
    sequence: AtomicU64,
    subscriptions: RwLock<Vec<Subscription>>,
}

/// Coordinator for graphs living in one process.
///
/// Clones share subscribers, so graphs opened with clones of one coordinator see
/// each other's notifications. Delivery is synchronous; nodes are not retained.
#[derive(Clone, Default)]
pub struct InProcessCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl InProcessCoordinator {
    /// Create a coordinator with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.watcher.strong_count() > 0)
            .count()
    }
}

impl CoordinationService for InProcessCoordinator {
    fn create_ephemeral_sequential(&self, path: &str, data: &[u8]) -> Result<String> {
        let seq = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        let node_path = format!("{}/n{:010}", path.trim_end_matches('/'), seq);

        let watchers: Vec<Arc<dyn CoordinationWatcher>> = {
            let mut subscriptions = self.inner.subscriptions.write();
            subscriptions.retain(|s| s.watcher.strong_count() > 0);
            subscriptions
                .iter()
                .filter(|s| s.covers(&node_path))
                .filter_map(|s| s.watcher.upgrade())
                .collect()
        };

        trace!("Notifying {} watchers of {}", watchers.len(), node_path);
        for watcher in watchers {
            watcher.on_change(&node_path, data);
        }
        Ok(node_path)
    }

    fn subscribe(&self, path: &str, watcher: Arc<dyn CoordinationWatcher>) -> Result<()> {
        self.inner.subscriptions.write().push(Subscription {
            path: path.trim_end_matches('/').to_string(),
            watcher: Arc::downgrade(&watcher),
        });
        Ok(())
    }
}
