use crate::error::BayesRustError;
use crate::tensor::utils::{broadcast_all_shapes, broadcast_shapes, calculate_strides, coord_to_index_broadcasted, index_to_coord};
use crate::tensor::Tensor;

impl Tensor {
    /// Expands the tensor to `target_shape` by adding leading dimensions and
    /// repeating dimensions of size 1.
    ///
    /// # Errors
    /// `ShapeMismatch` if this shape does not broadcast to exactly `target_shape`.
    pub fn broadcast_to(&self, target_shape: &[usize]) -> Result<Tensor, BayesRustError> {
        if self.shape() == target_shape {
            return Ok(self.clone());
        }
        match broadcast_shapes(self.shape(), target_shape) {
            Ok(shape) if shape == target_shape => {}
            _ => {
                return Err(BayesRustError::ShapeMismatch {
                    expected: target_shape.to_vec(),
                    actual: self.shape().to_vec(),
                    operation: "broadcast_to".to_string(),
                })
            }
        }
        let data = expand_kernel(target_shape, self.data(), self.shape(), self.strides());
        Ok(Tensor::from_parts(data, target_shape.to_vec(), self.dtype()))
    }

    /// Reduces the tensor to a target shape by summing along broadcast dimensions.
    /// Inverse of `broadcast_to` for accumulating derivatives.
    pub fn sum_to_shape(&self, target_shape: &[usize]) -> Result<Tensor, BayesRustError> {
        let current_shape = self.shape();
        if current_shape == target_shape {
            return Ok(self.clone());
        }

        let current_rank = current_shape.len();
        let target_rank = target_shape.len();
        if current_rank < target_rank {
            return Err(BayesRustError::ShapeMismatch {
                expected: target_shape.to_vec(),
                actual: current_shape.to_vec(),
                operation: "sum_to_shape".to_string(),
            });
        }

        let rank_diff = current_rank - target_rank;
        let mut axes_to_reduce: Vec<usize> = (0..rank_diff).collect();
        for i in 0..target_rank {
            let current_dim = current_shape[rank_diff + i];
            let target_dim = target_shape[i];
            if current_dim != target_dim {
                if target_dim == 1 {
                    axes_to_reduce.push(rank_diff + i);
                } else {
                    return Err(BayesRustError::ShapeMismatch {
                        expected: target_shape.to_vec(),
                        actual: current_shape.to_vec(),
                        operation: "sum_to_shape".to_string(),
                    });
                }
            }
        }

        let reduced = self.sum(Some(&axes_to_reduce), true)?;
        reduced.reshape(target_shape.to_vec())
    }
}

/// Broadcasts every tensor to their common shape.
pub fn broadcast_all(tensors: &[&Tensor]) -> Result<Vec<Tensor>, BayesRustError> {
    let shapes: Vec<&[usize]> = tensors.iter().map(|t| t.shape()).collect();
    let target = broadcast_all_shapes(&shapes)?;
    tensors.iter().map(|t| t.broadcast_to(&target)).collect()
}

pub(crate) fn expand_kernel(
    target_shape: &[usize],
    source_data: &[f64],
    source_shape: &[usize],
    source_strides: &[usize],
) -> Vec<f64> {
    let target_numel = target_shape.iter().product::<usize>();
    let target_strides = calculate_strides(target_shape);
    (0..target_numel)
        .map(|i| {
            let coord = index_to_coord(i, &target_strides, target_shape);
            source_data[coord_to_index_broadcasted(&coord, source_shape, source_strides)]
        })
        .collect()
}
