//! Local dense tensor values
//!
//! This is the concrete value a pointer materializes into: a flat f32 buffer
//! plus a shape. Only the operations the fan-out path needs exist here;
//! anything resembling a real math library lives behind the workers.

use crate::errors::{Result, TensorMeshError};
use serde::{Deserialize, Serialize};

/// Dense tensor of f32 values with an explicit shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    /// Flattened row-major data
    pub data: Vec<f32>,
    /// Shape of the tensor (e.g., [100] for 1D, [10, 10] for 2D)
    pub shape: Vec<usize>,
}

impl Tensor {
    /// Create a new tensor with the given data and shape
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(TensorMeshError::InvalidShape {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Self { data, shape })
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len: usize = shape.iter().product();
        Self {
            data: vec![0.0; len],
            shape,
        }
    }

    /// Create a tensor filled with a constant value
    pub fn filled(shape: Vec<usize>, value: f32) -> Self {
        let len: usize = shape.iter().product();
        Self {
            data: vec![value; len],
            shape,
        }
    }

    /// Shape of the tensor
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elementwise addition
    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        if self.shape != other.shape {
            return Err(TensorMeshError::IncompatibleShapes {
                left: self.shape.clone(),
                right: other.shape.clone(),
            });
        }

        let data: Vec<f32> = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();

        Ok(Tensor {
            data,
            shape: self.shape.clone(),
        })
    }

    /// Reduce a non-empty sequence of tensors by elementwise addition
    pub fn sum_all(tensors: &[Tensor]) -> Result<Tensor> {
        let (first, rest) = tensors
            .split_first()
            .ok_or(TensorMeshError::EmptyShardSet)?;
        rest.iter().try_fold(first.clone(), |acc, t| acc.add(t))
    }
}
