//! Remote worker boundary
//!
//! A worker is a participant in the mesh that holds tensor objects on behalf
//! of other parties. Pointers address workers only through the [`Worker`]
//! trait; the in-process [`VirtualWorker`] is the reference implementation
//! and real transports plug in behind the same trait.

pub mod registry;
pub mod virtual_worker;

pub use registry::WorkerRegistry;
pub use virtual_worker::VirtualWorker;

use crate::errors::Result;
use crate::tensor::Tensor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a remote participant holding tensor objects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a tensor object in a worker's store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generate a fresh random object id
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A remote participant that stores tensor objects and serves fetches.
///
/// `fetch_object` and `store_object` stand in for remote round trips and are
/// async. `forget_object` is synchronous and idempotent so that pointer
/// handles can request remote deletion from `Drop`.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Identity of this worker
    fn id(&self) -> &WorkerId;

    /// Retrieve the concrete tensor stored under `object`
    async fn fetch_object(&self, object: ObjectId) -> Result<Tensor>;

    /// Store a tensor under `object`, replacing any previous value
    async fn store_object(&self, object: ObjectId, tensor: Tensor) -> Result<()>;

    /// Request deletion of `object`. Deleting an absent object is a no-op.
    fn forget_object(&self, object: ObjectId);

    /// Check whether `object` is currently held by this worker
    fn has_object(&self, object: ObjectId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id_display() {
        let id = WorkerId::from("alice");
        assert_eq!(id.to_string(), "alice");
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn test_object_id_uniqueness() {
        let a = ObjectId::random();
        let b = ObjectId::random();
        assert_ne!(a, b);
    }
}
