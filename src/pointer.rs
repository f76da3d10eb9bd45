//! Pointer tensors: a local handle to a tensor held by a remote worker
//!
//! A [`PointerTensor`] owns no data. It records which worker holds the real
//! tensor, under which object id, and what shape it has, and materializes it
//! on demand via [`PointerTensor::get`]. If `garbage_collect_data` is set
//! (the default), the remote object is deleted once the pointer is done with
//! it: after a successful `get`, or when the handle is dropped.

use crate::errors::Result;
use crate::tensor::Tensor;
use crate::worker::{ObjectId, Worker, WorkerId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Local handle to a single remote tensor shard
pub struct PointerTensor {
    /// Identity of this handle
    id: Uuid,

    /// The worker holding the data
    worker: Arc<dyn Worker>,

    /// Object id of the data on the remote worker
    id_at_location: ObjectId,

    /// Shape of the remote tensor, recorded at pointer creation
    shape: Vec<usize>,

    /// Whether to request remote deletion when this pointer is done
    garbage_collect_data: bool,

    /// Set when the pointer no longer points at a named object itself but at
    /// one of its attributes (e.g. ".grad")
    point_to_attr: Option<String>,

    tags: Vec<String>,
    description: Option<String>,

    /// Whether remote deletion has already been requested
    released: AtomicBool,
}

impl PointerTensor {
    /// Create a pointer to `id_at_location` on `worker` with the given shape
    pub fn new(worker: Arc<dyn Worker>, id_at_location: ObjectId, shape: Vec<usize>) -> Self {
        Self {
            id: Uuid::new_v4(),
            worker,
            id_at_location,
            shape,
            garbage_collect_data: true,
            point_to_attr: None,
            tags: Vec::new(),
            description: None,
            released: AtomicBool::new(false),
        }
    }

    /// Set whether the remote object is deleted when this pointer is done
    pub fn with_garbage_collection(mut self, enabled: bool) -> Self {
        self.garbage_collect_data = enabled;
        self
    }

    /// Point at a named attribute of the remote object instead of the object
    pub fn with_point_to_attr(mut self, attr: impl Into<String>) -> Self {
        self.point_to_attr = Some(attr.into());
        self
    }

    /// Attach searchable tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Attach a human-readable description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Identity of this handle
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identifier of the worker holding the data
    pub fn location(&self) -> &WorkerId {
        self.worker.id()
    }

    /// Object id of the data on the remote worker
    pub fn id_at_location(&self) -> ObjectId {
        self.id_at_location
    }

    /// Shape of the remote tensor
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Whether remote deletion is requested when this pointer is done
    pub fn garbage_collect_data(&self) -> bool {
        self.garbage_collect_data
    }

    /// Attribute of the remote object this pointer targets, if any
    pub fn point_to_attr(&self) -> Option<&str> {
        self.point_to_attr.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Materialize the remote tensor.
    ///
    /// Awaits the worker round trip. When `garbage_collect_data` is set,
    /// a successful fetch also deletes the remote object, so the pointer can
    /// only be materialized once.
    pub async fn get(&self) -> Result<Tensor> {
        let tensor = self.worker.fetch_object(self.id_at_location).await?;

        if self.garbage_collect_data {
            self.release_remote();
        }

        debug!(
            location = %self.location(),
            object = %self.id_at_location,
            shape = ?tensor.shape,
            "Materialized pointer"
        );

        Ok(tensor)
    }

    /// Request deletion of the remote object. Idempotent.
    pub fn release_remote(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.worker.forget_object(self.id_at_location);
        }
    }
}

impl Drop for PointerTensor {
    fn drop(&mut self) {
        if self.garbage_collect_data && !self.released.load(Ordering::Acquire) {
            self.worker.forget_object(self.id_at_location);
        }
    }
}

impl std::fmt::Debug for PointerTensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerTensor")
            .field("id", &self.id)
            .field("location", self.location())
            .field("id_at_location", &self.id_at_location)
            .field("shape", &self.shape)
            .field("garbage_collect_data", &self.garbage_collect_data)
            .field("point_to_attr", &self.point_to_attr)
            .finish()
    }
}
