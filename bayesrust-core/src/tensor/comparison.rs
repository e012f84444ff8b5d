use crate::error::BayesRustError;
use crate::tensor::arithmetic::broadcast_binary;
use crate::tensor::broadcast_utils::broadcast_all;
use crate::tensor::Tensor;
use crate::types::DType;

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Tensor {
    pub fn lt(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::Bool, |a, b| flag(a < b))
    }

    pub fn le(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::Bool, |a, b| flag(a <= b))
    }

    pub fn gt(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::Bool, |a, b| flag(a > b))
    }

    pub fn ge(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::Bool, |a, b| flag(a >= b))
    }

    pub fn eq_elem(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::Bool, |a, b| flag(a == b))
    }

    pub fn logical_and(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::Bool, |a, b| flag(a != 0.0 && b != 0.0))
    }

    pub fn logical_or(&self, other: &Tensor) -> Result<Tensor, BayesRustError> {
        broadcast_binary(self, other, DType::Bool, |a, b| flag(a != 0.0 || b != 0.0))
    }

    pub fn logical_not(&self) -> Tensor {
        let data = self.data().iter().map(|&a| flag(a == 0.0)).collect();
        Tensor::from_parts(data, self.shape().to_vec(), DType::Bool)
    }

    /// Selects from `on_true` where `mask` is non-zero and from `on_false`
    /// elsewhere, broadcasting all three.
    pub fn where_mask(mask: &Tensor, on_true: &Tensor, on_false: &Tensor) -> Result<Tensor, BayesRustError> {
        let parts = broadcast_all(&[mask, on_true, on_false])?;
        let data = parts[0]
            .data()
            .iter()
            .zip(parts[1].data())
            .zip(parts[2].data())
            .map(|((&m, &t), &f)| if m != 0.0 { t } else { f })
            .collect();
        let dtype = if on_true.dtype() == on_false.dtype() {
            on_true.dtype()
        } else {
            DType::F64
        };
        Ok(Tensor::from_parts(data, parts[0].shape().to_vec(), dtype))
    }

    /// Replaces elements where `mask` is non-zero with `value`.
    pub fn masked_fill(&self, mask: &Tensor, value: f64) -> Result<Tensor, BayesRustError> {
        let fill = Tensor::from_parts(vec![value], vec![], self.dtype());
        Tensor::where_mask(mask, &fill, self)
    }

    pub fn any(&self) -> bool {
        self.data().iter().any(|&v| v != 0.0)
    }

    pub fn all(&self) -> bool {
        self.data().iter().all(|&v| v != 0.0)
    }
}

#[cfg(test)]
#[path = "comparison_test.rs"]
mod tests;
