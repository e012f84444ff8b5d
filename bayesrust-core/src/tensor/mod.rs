// src/tensor/mod.rs

use crate::error::BayesRustError;
use crate::tensor_data::TensorData;
use crate::types::DType;
use std::sync::Arc;

mod arithmetic;
mod comparison;
pub mod create;
mod reduction;
mod traits;
mod view_methods;

pub mod broadcast_utils;
pub mod utils;

pub use create::{eye_for_shape, from_bools, from_ints, full, linspace, ones, scalar, zeros};

/// Immutable multi-dimensional array of numbers.
///
/// `Tensor` wraps its storage in an `Arc`, so clones are cheap and share the
/// buffer. Every operation returns a new tensor; nothing mutates in place.
#[derive(Clone)]
pub struct Tensor {
    pub(crate) data: Arc<TensorData>,
}

impl Tensor {
    /// Creates a new F64 tensor from row-major data and a shape.
    pub fn new(data_vec: Vec<f64>, shape: Vec<usize>) -> Result<Self, BayesRustError> {
        Self::new_with_dtype(data_vec, shape, DType::F64)
    }

    /// Creates a tensor whose values are interpreted as `dtype`.
    /// Values are coerced (truncated for `I64`, zero/non-zero for `Bool`).
    pub fn new_with_dtype(
        data_vec: Vec<f64>,
        shape: Vec<usize>,
        dtype: DType,
    ) -> Result<Self, BayesRustError> {
        let tensor_data = TensorData::new(data_vec, shape, dtype)?;
        Ok(Tensor {
            data: Arc::new(tensor_data),
        })
    }

    pub(crate) fn from_parts(buffer: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Self {
        Tensor {
            data: Arc::new(TensorData::from_parts(buffer, shape, dtype)),
        }
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.data.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.data.strides
    }

    pub fn rank(&self) -> usize {
        self.data.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.numel()
    }

    pub fn is_scalar(&self) -> bool {
        self.numel() == 1
    }

    /// Flat, row-major view of the values.
    pub fn data(&self) -> &[f64] {
        &self.data.buffer
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.buffer.clone()
    }

    /// Value at a multi-dimensional index.
    pub fn get(&self, indices: &[usize]) -> Result<f64, BayesRustError> {
        let offset = self.data.get_offset(indices)?;
        Ok(self.data.buffer[offset])
    }

    /// Value at a flat, row-major index.
    pub fn flat_get(&self, index: usize) -> Result<f64, BayesRustError> {
        self.data
            .buffer
            .get(index)
            .copied()
            .ok_or_else(|| BayesRustError::IndexOutOfBounds {
                index: vec![index],
                shape: self.shape().to_vec(),
            })
    }

    /// The single value of a one-element tensor, whatever its rank.
    pub fn scalar_value(&self) -> Result<f64, BayesRustError> {
        if self.numel() != 1 {
            return Err(BayesRustError::ShapeMismatch {
                expected: vec![],
                actual: self.shape().to_vec(),
                operation: "scalar_value".to_string(),
            });
        }
        Ok(self.data.buffer[0])
    }

    /// Casts to another dtype, coercing the values.
    pub fn cast(&self, dtype: DType) -> Tensor {
        if dtype == self.dtype() {
            return self.clone();
        }
        Tensor::from_parts(self.to_vec(), self.shape().to_vec(), dtype)
    }

    /// Checks that every value is a whole number, as required for `I64` inputs.
    pub fn is_integral(&self) -> bool {
        self.data().iter().all(|v| v.is_finite() && v.fract() == 0.0)
    }

    /// Elementwise approximate equality with a combined tolerance.
    pub fn all_close(&self, other: &Tensor, tolerance: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data()
                .iter()
                .zip(other.data())
                .all(|(a, b)| a == b || (a - b).abs() <= tolerance)
    }
}

#[cfg(test)]
mod tests;
