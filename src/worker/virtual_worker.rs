//! In-process worker with an in-memory object store
//!
//! `VirtualWorker` plays the role of a remote participant without any
//! networking: objects live in a local map and fetches optionally sleep to
//! simulate the round trip. It backs every test in this crate and the demo
//! binary; production transports implement [`Worker`] instead.

use crate::errors::{Result, TensorMeshError};
use crate::pointer::PointerTensor;
use crate::tensor::Tensor;
use crate::worker::{ObjectId, Worker, WorkerId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

/// Worker implementation holding objects in local memory
pub struct VirtualWorker {
    id: WorkerId,

    /// Object store. Sync lock, never held across an await,
    /// so forget_object stays callable from Drop.
    objects: RwLock<HashMap<ObjectId, Tensor>>,

    /// Simulated round-trip latency applied before each fetch
    fetch_delay: Option<Duration>,
}

impl VirtualWorker {
    /// Create a new virtual worker with the given identity
    pub fn new(id: impl Into<WorkerId>) -> Self {
        Self {
            id: id.into(),
            objects: RwLock::new(HashMap::new()),
            fetch_delay: None,
        }
    }

    /// Simulate fetch latency (useful for exercising timeouts)
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Number of objects currently held
    pub fn num_objects(&self) -> usize {
        self.objects
            .read()
            .map(|objects| objects.len())
            .unwrap_or(0)
    }

    /// Create a pointer to an object already stored on this worker.
    ///
    /// The pointer's shape is read from the stored tensor; pointing at an
    /// absent object is an error.
    pub fn create_pointer(self: &Arc<Self>, object: ObjectId) -> Result<PointerTensor> {
        let shape = {
            let objects = self
                .objects
                .read()
                .map_err(|e| self.lock_error(e.to_string()))?;
            objects
                .get(&object)
                .map(|t| t.shape.clone())
                .ok_or_else(|| TensorMeshError::ObjectMissing {
                    object,
                    location: self.id.clone(),
                })?
        };

        Ok(PointerTensor::new(
            Arc::clone(self) as Arc<dyn Worker>,
            object,
            shape,
        ))
    }

    fn lock_error(&self, reason: String) -> TensorMeshError {
        TensorMeshError::Retrieval {
            location: self.id.clone(),
            reason,
        }
    }
}

#[async_trait]
impl Worker for VirtualWorker {
    fn id(&self) -> &WorkerId {
        &self.id
    }

    async fn fetch_object(&self, object: ObjectId) -> Result<Tensor> {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        let objects = self
            .objects
            .read()
            .map_err(|e| self.lock_error(e.to_string()))?;

        let tensor = objects
            .get(&object)
            .cloned()
            .ok_or_else(|| TensorMeshError::ObjectMissing {
                object,
                location: self.id.clone(),
            })?;

        debug!(worker = %self.id, object = %object, "Fetched object");
        Ok(tensor)
    }

    async fn store_object(&self, object: ObjectId, tensor: Tensor) -> Result<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| self.lock_error(e.to_string()))?;
        objects.insert(object, tensor);
        debug!(worker = %self.id, object = %object, "Stored object");
        Ok(())
    }

    fn forget_object(&self, object: ObjectId) {
        if let Ok(mut objects) = self.objects.write() {
            if objects.remove(&object).is_some() {
                debug!(worker = %self.id, object = %object, "Forgot object");
            }
        }
    }

    fn has_object(&self, object: ObjectId) -> bool {
        self.objects
            .read()
            .map(|objects| objects.contains_key(&object))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_fetch() {
        let worker = VirtualWorker::new("alice");
        let object = ObjectId::random();
        let tensor = Tensor::filled(vec![2, 2], 1.5);

        worker.store_object(object, tensor.clone()).await.unwrap();
        assert!(worker.has_object(object));

        let fetched = worker.fetch_object(object).await.unwrap();
        assert_eq!(fetched, tensor);
    }

    #[tokio::test]
    async fn test_fetch_missing_object() {
        let worker = VirtualWorker::new("alice");
        let err = worker.fetch_object(ObjectId::random()).await.unwrap_err();
        assert!(matches!(err, TensorMeshError::ObjectMissing { .. }));
    }

    #[tokio::test]
    async fn test_forget_is_idempotent() {
        let worker = VirtualWorker::new("alice");
        let object = ObjectId::random();
        worker
            .store_object(object, Tensor::zeros(vec![2]))
            .await
            .unwrap();

        worker.forget_object(object);
        assert!(!worker.has_object(object));

        // Forgetting again is a no-op
        worker.forget_object(object);
        assert_eq!(worker.num_objects(), 0);
    }

    #[tokio::test]
    async fn test_create_pointer_reads_shape() {
        let worker = Arc::new(VirtualWorker::new("alice"));
        let object = ObjectId::random();
        worker
            .store_object(object, Tensor::filled(vec![3, 4], 1.0))
            .await
            .unwrap();

        let pointer = worker.create_pointer(object).unwrap();
        assert_eq!(pointer.shape(), &[3, 4]);
        assert_eq!(pointer.location(), &WorkerId::from("alice"));
    }

    #[tokio::test]
    async fn test_create_pointer_missing_object() {
        let worker = Arc::new(VirtualWorker::new("alice"));
        let err = worker.create_pointer(ObjectId::random()).unwrap_err();
        assert!(matches!(err, TensorMeshError::ObjectMissing { .. }));
    }

    #[tokio::test]
    async fn test_fetch_delay() {
        let worker = VirtualWorker::new("slow").with_fetch_delay(Duration::from_millis(20));
        let object = ObjectId::random();
        worker
            .store_object(object, Tensor::zeros(vec![1]))
            .await
            .unwrap();

        let start = std::time::Instant::now();
        worker.fetch_object(object).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
