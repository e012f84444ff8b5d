// src/tensor_data.rs
use crate::error::BayesRustError;
use crate::tensor::utils::calculate_strides;
use crate::types::DType;

/// Internal storage and metadata for a Tensor.
///
/// Values are always stored as `f64`; the `dtype` tag records how they are
/// interpreted (real, integer count or boolean). Data is contiguous and
/// row-major, so `strides` are derived from `shape`.
#[derive(Debug, Clone)]
pub struct TensorData {
    pub(crate) buffer: Vec<f64>,
    pub(crate) dtype: DType,
    pub(crate) shape: Vec<usize>,
    pub(crate) strides: Vec<usize>,
}

impl TensorData {
    /// Creates a new `TensorData` from a flat, row-major buffer.
    ///
    /// # Errors
    /// Returns `BayesRustError::TensorCreationError` if the length of `buffer`
    /// does not match the number of elements described by `shape`.
    pub fn new(buffer: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Result<Self, BayesRustError> {
        let numel: usize = shape.iter().product();
        if buffer.len() != numel {
            return Err(BayesRustError::TensorCreationError {
                data_len: buffer.len(),
                shape,
            });
        }
        Ok(Self::from_parts(buffer, shape, dtype))
    }

    /// Builds the storage without checking `buffer` against `shape`.
    /// Callers inside the crate guarantee consistency.
    pub(crate) fn from_parts(buffer: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Self {
        let buffer = if dtype.is_float() {
            buffer
        } else {
            buffer.into_iter().map(|v| dtype.coerce(v)).collect()
        };
        let strides = calculate_strides(&shape);
        TensorData {
            buffer,
            dtype,
            shape,
            strides,
        }
    }

    pub fn numel(&self) -> usize {
        self.buffer.len()
    }

    /// Calculates the linear offset of `indices` in the buffer.
    pub fn get_offset(&self, indices: &[usize]) -> Result<usize, BayesRustError> {
        if indices.len() != self.shape.len()
            || indices.iter().zip(self.shape.iter()).any(|(i, d)| i >= d)
        {
            return Err(BayesRustError::IndexOutOfBounds {
                index: indices.to_vec(),
                shape: self.shape.clone(),
            });
        }
        Ok(indices
            .iter()
            .zip(self.strides.iter())
            .map(|(i, s)| i * s)
            .sum())
    }
}
