use crate::error::BayesRustError;
use crate::tensor::utils::{broadcast_shapes, calculate_strides, coord_to_index_broadcasted, index_to_coord};
use crate::tensor::Tensor;
use crate::types::DType;

/// Applies `op` elementwise over the broadcast of `a` and `b`.
pub(crate) fn broadcast_binary<F>(
    a: &Tensor,
    b: &Tensor,
    out_dtype: DType,
    op: F,
) -> Result<Tensor, BayesRustError>
where
    F: Fn(f64, f64) -> f64,
{
    let a_shape = a.shape();
    let b_shape = b.shape();

    if a_shape == b_shape {
        let data = a.data().iter().zip(b.data()).map(|(&x, &y)| op(x, y)).collect();
        return Ok(Tensor::from_parts(data, a_shape.to_vec(), out_dtype));
    }

    let output_shape = broadcast_shapes(a_shape, b_shape)?;
    let numel: usize = output_shape.iter().product();
    let output_strides = calculate_strides(&output_shape);
    let (a_data, b_data) = (a.data(), b.data());
    let (a_strides, b_strides) = (a.strides(), b.strides());

    let mut result = Vec::with_capacity(numel);
    for i in 0..numel {
        let coords = index_to_coord(i, &output_strides, &output_shape);
        let a_idx = coord_to_index_broadcasted(&coords, a_shape, a_strides);
        let b_idx = coord_to_index_broadcasted(&coords, b_shape, b_strides);
        result.push(op(a_data[a_idx], b_data[b_idx]));
    }
    Ok(Tensor::from_parts(result, output_shape, out_dtype))
}

impl Tensor {
    pub fn add(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::F64, |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::F64, |a, b| a - b)
    }

    pub fn mul(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::F64, |a, b| a * b)
    }

    pub fn div(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::F64, |a, b| a / b)
    }

    pub fn pow(&self, exponent: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, exponent, DType::F64, f64::powf)
    }

    pub fn add_scalar(&self, value: f64) -> Tensor {
        self.map(|x| x + value)
    }

    pub fn mul_scalar(&self, value: f64) -> Tensor {
        self.map(|x| x * value)
    }

    pub fn pow_scalar(&self, exponent: f64) -> Tensor {
        self.map(|x| x.powf(exponent))
    }

    /// `value - self`
    pub fn rsub_scalar(&self, value: f64) -> Tensor {
        self.map(|x| value - x)
    }

    /// Applies `f` to every element, producing an F64 tensor of the same shape.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Tensor {
        let data = self.data().iter().map(|&x| f(x)).collect();
        Tensor::from_parts(data, self.shape().to_vec(), DType::F64)
    }

    pub fn neg(&self) -> Tensor {
        self.map(|x| -x)
    }

    pub fn exp(&self) -> Tensor {
        self.map(f64::exp)
    }

    pub fn ln(&self) -> Tensor {
        self.map(f64::ln)
    }

    pub fn abs(&self) -> Tensor {
        self.map(f64::abs)
    }

    pub fn sqrt(&self) -> Tensor {
        self.map(f64::sqrt)
    }

    pub fn recip(&self) -> Tensor {
        self.map(f64::recip)
    }

    pub fn square(&self) -> Tensor {
        self.map(|x| x * x)
    }

    pub fn clamp(&self, min: f64, max: f64) -> Tensor {
        self.map(|x| x.clamp(min, max))
    }
}

#[cfg(test)]
#[path = "arithmetic_test.rs"]
mod tests;
