//! Worker registry for resolving locations to live worker handles
//!
//! The registry maps [`WorkerId`]s to worker handles so that callers holding
//! only a location identifier can reach the participant behind it.

use crate::worker::{Worker, WorkerId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Registry of known workers, keyed by identity
#[derive(Default)]
pub struct WorkerRegistry {
    workers: RwLock<HashMap<WorkerId, Arc<dyn Worker>>>,
}

impl WorkerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker, replacing any previous handle under the same id
    pub async fn register(&self, worker: Arc<dyn Worker>) {
        let id = worker.id().clone();
        let mut workers = self.workers.write().await;
        workers.insert(id.clone(), worker);
        info!(worker = %id, "Registered worker");
    }

    /// Look up a worker by identity
    pub async fn get(&self, id: &WorkerId) -> Option<Arc<dyn Worker>> {
        let workers = self.workers.read().await;
        workers.get(id).cloned()
    }

    /// Remove a worker from the registry
    pub async fn deregister(&self, id: &WorkerId) -> Option<Arc<dyn Worker>> {
        let mut workers = self.workers.write().await;
        let removed = workers.remove(id);
        if removed.is_some() {
            debug!(worker = %id, "Deregistered worker");
        }
        removed
    }

    /// List the identities of all registered workers
    pub async fn list(&self) -> Vec<WorkerId> {
        let workers = self.workers.read().await;
        workers.keys().cloned().collect()
    }

    /// Number of registered workers
    pub async fn len(&self) -> usize {
        let workers = self.workers.read().await;
        workers.len()
    }

    /// Check whether the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
