//! Multi-pointer tensors: one logical tensor fanned out across workers
//!
//! A [`MultiPointerTensor`] holds one [`PointerTensor`] per remote location,
//! all describing shards of the same logical tensor. It exposes shape
//! introspection and [`MultiPointerTensor::get`], which materializes every
//! shard and either returns them in construction order or reduces them by
//! elementwise addition.
//!
//! Invariants enforced at construction, permanently (the handle is
//! immutable afterwards):
//! - at least one child shard,
//! - all child shapes equal,
//! - at most one child per location.

use crate::errors::{Result, TensorMeshError};
use crate::pointer::PointerTensor;
use crate::tensor::Tensor;
use crate::worker::WorkerId;
use futures::future;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of a fan-out materialization
#[derive(Debug, Clone, PartialEq)]
pub enum Gathered {
    /// Per-shard tensors, in the handle's child order
    Shards(Vec<Tensor>),
    /// Elementwise sum of all shards
    Reduced(Tensor),
}

/// Outcome of a fan-out that tolerates per-shard failures
#[derive(Debug)]
pub struct PartialGather {
    /// Successfully retrieved shards, in the handle's child order
    pub shards: Vec<(WorkerId, Tensor)>,
    /// Locations whose retrieval failed, with the failure
    pub failures: Vec<(WorkerId, TensorMeshError)>,
}

impl PartialGather {
    /// Whether every shard was retrieved
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Handle to a logical tensor whose shards live on multiple workers
pub struct MultiPointerTensor {
    /// Identity of this handle
    id: Uuid,

    /// Worker that owns this handle, if any
    owner: Option<WorkerId>,

    /// Whether dropping the handle requests deletion of every remote shard
    garbage_collect_data: bool,

    /// Set when the handle points at a named attribute of the remote
    /// objects (e.g. ".grad") rather than the objects themselves
    point_to_attr: Option<String>,

    tags: Vec<String>,
    description: Option<String>,

    /// Logical shape of the full tensor, when known up front
    cached_shape: Option<Vec<usize>>,

    /// Child shards in construction order. One per location.
    children: Vec<PointerTensor>,

    /// Per-shard retrieval deadline, when configured
    fetch_timeout: Option<Duration>,
}

impl MultiPointerTensor {
    /// Build a multi-pointer from child shards.
    ///
    /// Fails with `EmptyShardSet` when `children` is empty, `ShapeMismatch`
    /// when any child disagrees with the first on shape, and
    /// `DuplicateLocation` when two children are bound to the same worker.
    pub fn new(children: Vec<PointerTensor>) -> Result<Self> {
        let first_shape = children
            .first()
            .map(|c| c.shape().to_vec())
            .ok_or(TensorMeshError::EmptyShardSet)?;

        let mut seen = HashSet::new();
        for child in &children {
            if child.shape() != first_shape.as_slice() {
                return Err(TensorMeshError::ShapeMismatch {
                    location: child.location().clone(),
                    expected: first_shape,
                    found: child.shape().to_vec(),
                });
            }
            if !seen.insert(child.location().clone()) {
                return Err(TensorMeshError::DuplicateLocation(
                    child.location().clone(),
                ));
            }
        }

        debug!(
            shards = children.len(),
            shape = ?first_shape,
            "Built multi-pointer tensor"
        );

        Ok(Self {
            id: Uuid::new_v4(),
            owner: None,
            garbage_collect_data: false,
            point_to_attr: None,
            tags: Vec::new(),
            description: None,
            cached_shape: None,
            children,
            fetch_timeout: None,
        })
    }

    /// Cache the logical shape instead of deriving it from a child
    pub fn with_shape(mut self, shape: Vec<usize>) -> Self {
        self.cached_shape = Some(shape);
        self
    }

    /// Record the owning worker
    pub fn with_owner(mut self, owner: WorkerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Request deletion of every remote shard when the handle is dropped
    pub fn with_garbage_collection(mut self, enabled: bool) -> Self {
        self.garbage_collect_data = enabled;
        self
    }

    /// Point at a named attribute of the remote objects
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

    /// Bound each per-shard retrieval by a deadline
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Identity of this handle
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Worker that owns this handle, if any
    pub fn owner(&self) -> Option<&WorkerId> {
        self.owner.as_ref()
    }

    /// Attribute of the remote objects this handle targets, if any
    pub fn point_to_attr(&self) -> Option<&str> {
        self.point_to_attr.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Number of child shards
    pub fn num_shards(&self) -> usize {
        self.children.len()
    }

    /// Locations of the child shards, in child order
    pub fn locations(&self) -> Vec<&WorkerId> {
        self.children.iter().map(|c| c.location()).collect()
    }

    /// The child shard bound to `location`, if any
    pub fn child(&self, location: &WorkerId) -> Option<&PointerTensor> {
        self.children.iter().find(|c| c.location() == location)
    }

    /// Logical shape of the full tensor.
    ///
    /// Prefers the cached shape; otherwise reads the first child's shape
    /// without re-verifying agreement across shards. Agreement was enforced
    /// at construction and the handle is immutable, so the unverified read
    /// is safe; callers wanting a cross-check use [`Self::verified_shape`].
    pub fn shape(&self) -> &[usize] {
        match &self.cached_shape {
            Some(shape) => shape,
            // Non-empty by construction
            None => self.children[0].shape(),
        }
    }

    /// Logical shape, cross-checked against every child shard
    pub fn verified_shape(&self) -> Result<&[usize]> {
        let expected = self.shape();
        for child in &self.children {
            if child.shape() != expected {
                return Err(TensorMeshError::ShapeMismatch {
                    location: child.location().clone(),
                    expected: expected.to_vec(),
                    found: child.shape().to_vec(),
                });
            }
        }
        Ok(expected)
    }

    /// Materialize every shard, optionally reducing by elementwise addition.
    ///
    /// Retrievals run concurrently; shard order in the unreduced result
    /// matches child order, not completion order. All-or-nothing: the first
    /// failing shard fails the whole call and its error is propagated
    /// unchanged. See [`Self::get_partial`] for the failure-tolerant mode.
    pub async fn get(&self, sum_results: bool) -> Result<Gathered> {
        debug!(
            handle = %self.id,
            shards = self.children.len(),
            sum_results,
            "Fanning out retrieval"
        );

        let results =
            future::try_join_all(self.children.iter().map(|child| self.fetch_child(child)))
                .await?;

        if sum_results {
            let reduced = Tensor::sum_all(&results)?;
            info!(handle = %self.id, shape = ?reduced.shape, "Reduced fan-out result");
            Ok(Gathered::Reduced(reduced))
        } else {
            Ok(Gathered::Shards(results))
        }
    }

    /// Materialize every shard, in child order
    pub async fn get_shards(&self) -> Result<Vec<Tensor>> {
        match self.get(false).await? {
            Gathered::Shards(shards) => Ok(shards),
            Gathered::Reduced(_) => unreachable!("get(false) never reduces"),
        }
    }

    /// Materialize and reduce every shard by elementwise addition
    pub async fn get_sum(&self) -> Result<Tensor> {
        match self.get(true).await? {
            Gathered::Reduced(tensor) => Ok(tensor),
            Gathered::Shards(_) => unreachable!("get(true) always reduces"),
        }
    }

    /// Materialize every shard, tolerating per-shard failures.
    ///
    /// Successes keep child order; each failed location is reported with
    /// the error that failed it.
    pub async fn get_partial(&self) -> PartialGather {
        let outcomes =
            future::join_all(self.children.iter().map(|child| async move {
                (child.location().clone(), self.fetch_child(child).await)
            }))
            .await;

        let mut shards = Vec::new();
        let mut failures = Vec::new();
        for (location, outcome) in outcomes {
            match outcome {
                Ok(tensor) => shards.push((location, tensor)),
                Err(err) => {
                    warn!(location = %location, error = %err, "Shard retrieval failed");
                    failures.push((location, err));
                }
            }
        }

        PartialGather { shards, failures }
    }

    async fn fetch_child(&self, child: &PointerTensor) -> Result<Tensor> {
        match self.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.get())
                .await
                .map_err(|_| TensorMeshError::FetchTimeout {
                    location: child.location().clone(),
                    after_ms: timeout.as_millis() as u64,
                })?,
            None => child.get().await,
        }
    }
}

impl Drop for MultiPointerTensor {
    fn drop(&mut self) {
        if self.garbage_collect_data {
            for child in &self.children {
                child.release_remote();
            }
        }
    }
}

impl std::fmt::Debug for MultiPointerTensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiPointerTensor")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("shape", &self.shape())
            .field("locations", &self.locations())
            .field("garbage_collect_data", &self.garbage_collect_data)
            .field("point_to_attr", &self.point_to_attr)
            .finish()
    }
}
