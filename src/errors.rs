use thiserror::Error;

use crate::worker::{ObjectId, WorkerId};

/// Errors that can occur when constructing or materializing tensor handles.
#[derive(Error, Debug)]
pub enum TensorMeshError {
    /// A multi-pointer was constructed with no child shards
    #[error("no child shards provided")]
    EmptyShardSet,

    /// A child shard disagrees with the others on shape
    #[error("shape mismatch at {location}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        location: WorkerId,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Two child shards claim the same remote location
    #[error("duplicate shard location: {0}")]
    DuplicateLocation(WorkerId),

    /// The remote worker does not hold the requested object
    #[error("object {object} not found on worker {location}")]
    ObjectMissing { object: ObjectId, location: WorkerId },

    /// A per-shard retrieval did not complete within the configured deadline
    #[error("fetch from {location} timed out after {after_ms}ms")]
    FetchTimeout { location: WorkerId, after_ms: u64 },

    /// Tensor data length does not match the claimed shape
    #[error("data length {data_len} doesn't match shape {shape:?}")]
    InvalidShape { data_len: usize, shape: Vec<usize> },

    /// Elementwise operation over tensors of differing shapes
    #[error("incompatible shapes for elementwise op: {left:?} vs {right:?}")]
    IncompatibleShapes { left: Vec<usize>, right: Vec<usize> },

    /// Retrieval failed for a transport- or worker-level reason
    #[error("retrieval from {location} failed: {reason}")]
    Retrieval { location: WorkerId, reason: String },
}

/// Result type alias for tensormesh operations.
pub type Result<T> = std::result::Result<T, TensorMeshError>;
