// src/tensor/create.rs

use crate::error::BayesRustError;
use crate::tensor::Tensor;
use crate::types::DType;
use num_traits::ToPrimitive;

/// Creates a new F64 tensor filled with zeros.
pub fn zeros(shape: &[usize]) -> Tensor {
    full(shape, 0.0)
}

/// Creates a new F64 tensor filled with ones.
pub fn ones(shape: &[usize]) -> Tensor {
    full(shape, 1.0)
}

/// Creates a new F64 tensor filled with `value`.
pub fn full(shape: &[usize], value: f64) -> Tensor {
    let numel = shape.iter().product();
    Tensor::from_parts(vec![value; numel], shape.to_vec(), DType::F64)
}

/// Creates a rank-0 F64 tensor.
pub fn scalar(value: f64) -> Tensor {
    Tensor::from_parts(vec![value], vec![], DType::F64)
}

/// Creates a `Bool` tensor.
pub fn from_bools(values: &[bool], shape: Vec<usize>) -> Result<Tensor, BayesRustError> {
    let data = values.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
    Tensor::new_with_dtype(data, shape, DType::Bool)
}

/// Creates an `I64` tensor from any integer type.
pub fn from_ints<I: ToPrimitive + Copy>(values: &[I], shape: Vec<usize>) -> Result<Tensor, BayesRustError> {
    let data = values
        .iter()
        .map(|v| {
            v.to_f64().ok_or_else(|| BayesRustError::NumericError {
                operation: "from_ints".to_string(),
                reason: "value not representable as f64".to_string(),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;
    Tensor::new_with_dtype(data, shape, DType::I64)
}

/// `count` evenly spaced values from `start` to `end` inclusive, shape `[count]`.
pub fn linspace(start: f64, end: f64, count: usize) -> Tensor {
    let data = match count {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    };
    Tensor::from_parts(data, vec![count], DType::F64)
}

/// Identity over a shape: a tensor of shape `shape ++ shape` holding one
/// where the leading and trailing multi-indices coincide.
pub fn eye_for_shape(shape: &[usize]) -> Tensor {
    let n: usize = shape.iter().product();
    let mut data = vec![0.0; n * n];
    for i in 0..n {
        data[i * n + i] = 1.0;
    }
    let mut out_shape = shape.to_vec();
    out_shape.extend_from_slice(shape);
    Tensor::from_parts(data, out_shape, DType::F64)
}

impl Tensor {
    pub fn scalar(value: f64) -> Tensor {
        scalar(value)
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        zeros(shape)
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        ones(shape)
    }

    pub fn full(shape: &[usize], value: f64) -> Tensor {
        full(shape, value)
    }

    /// Zeros with this tensor's shape, as F64.
    pub fn zeros_like(&self) -> Tensor {
        zeros(self.shape())
    }

    pub fn ones_like(&self) -> Tensor {
        ones(self.shape())
    }
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;
