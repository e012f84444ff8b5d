use crate::error::BayesRustError;
use crate::tensor::Tensor;

impl Tensor {
    /// Returns the same values under a new shape with equal element count.
    pub fn reshape(&self, new_shape: Vec<usize>) -> Result<Self, BayesRustError> {
        let new_numel: usize = new_shape.iter().product();
        if new_numel != self.numel() {
            return Err(BayesRustError::ShapeMismatch {
                expected: new_shape,
                actual: self.shape().to_vec(),
                operation: "reshape".to_string(),
            });
        }
        if new_shape == self.shape() {
            return Ok(self.clone());
        }
        Ok(Tensor::from_parts(self.to_vec(), new_shape, self.dtype()))
    }

    /// Flattens to rank 1.
    pub fn flatten(&self) -> Tensor {
        Tensor::from_parts(self.to_vec(), vec![self.numel()], self.dtype())
    }

    /// Joins tensors along `axis`. All inputs must share rank and every
    /// dimension other than `axis`.
    pub fn concat(tensors: &[&Tensor], axis: usize) -> Result<Tensor, BayesRustError> {
        let first = tensors.first().ok_or_else(|| {
            BayesRustError::InvalidState("concat requires at least one tensor".to_string())
        })?;
        let rank = first.rank();
        if axis >= rank {
            return Err(BayesRustError::InvalidAxis { axis, rank });
        }
        for t in tensors.iter().skip(1) {
            let compatible = t.rank() == rank
                && t
                    .shape()
                    .iter()
                    .zip(first.shape())
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b);
            if !compatible {
                return Err(BayesRustError::ShapeMismatch {
                    expected: first.shape().to_vec(),
                    actual: t.shape().to_vec(),
                    operation: format!("concat along axis {}", axis),
                });
            }
        }

        let outer: usize = first.shape()[..axis].iter().product();
        let mut out_shape = first.shape().to_vec();
        out_shape[axis] = tensors.iter().map(|t| t.shape()[axis]).sum();
        let mut data = Vec::with_capacity(out_shape.iter().product());
        for o in 0..outer {
            for t in tensors {
                let block: usize = t.shape()[axis..].iter().product();
                data.extend_from_slice(&t.data()[o * block..(o + 1) * block]);
            }
        }
        let dtype = if tensors.iter().all(|t| t.dtype() == first.dtype()) {
            first.dtype()
        } else {
            crate::types::DType::F64
        };
        Ok(Tensor::from_parts(data, out_shape, dtype))
    }

    /// Takes position `index` along `axis`, removing that axis.
    pub fn select(&self, axis: usize, index: usize) -> Result<Tensor, BayesRustError> {
        let rank = self.rank();
        if axis >= rank {
            return Err(BayesRustError::InvalidAxis { axis, rank });
        }
        let dim = self.shape()[axis];
        if index >= dim {
            return Err(BayesRustError::IndexOutOfBounds {
                index: vec![index],
                shape: self.shape().to_vec(),
            });
        }
        let outer: usize = self.shape()[..axis].iter().product();
        let inner: usize = self.shape()[axis + 1..].iter().product();
        let mut data = Vec::with_capacity(outer * inner);
        for o in 0..outer {
            let start = (o * dim + index) * inner;
            data.extend_from_slice(&self.data()[start..start + inner]);
        }
        let mut out_shape = self.shape().to_vec();
        out_shape.remove(axis);
        Ok(Tensor::from_parts(data, out_shape, self.dtype()))
    }
}

#[cfg(test)]
#[path = "view_methods_test.rs"]
mod tests;
