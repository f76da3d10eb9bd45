//! Federated tensor handles for the tensormesh network.
//!
//! A logical tensor can be fragmented across multiple remote workers. This
//! crate provides the local handles over those fragments:
//!
//! - [`PointerTensor`]: a handle to one tensor shard held by one worker
//! - [`MultiPointerTensor`]: a location-keyed set of pointers over one
//!   logical tensor, with fan-out retrieval and optional reduction
//! - [`Worker`] / [`VirtualWorker`] / [`WorkerRegistry`]: the remote
//!   participant boundary and its in-process implementation

pub mod errors;
pub mod logging;
pub mod multipointer;
pub mod pointer;
pub mod tensor;
pub mod worker;

pub use errors::{Result, TensorMeshError};
pub use logging::init_logging;
pub use multipointer::{Gathered, MultiPointerTensor, PartialGather};
pub use pointer::PointerTensor;
pub use tensor::Tensor;
pub use worker::{ObjectId, VirtualWorker, Worker, WorkerId, WorkerRegistry};
