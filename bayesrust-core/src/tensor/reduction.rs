use crate::error::BayesRustError;
use crate::tensor::utils::{calculate_strides, index_to_coord};
use crate::tensor::Tensor;
use crate::types::DType;

impl Tensor {
    /// Sums over `axes` (all axes when `None`).
    ///
    /// With `keep_dims` the reduced axes stay as size 1; otherwise they are removed.
    pub fn sum(&self, axes: Option<&[usize]>, keep_dims: bool) -> Result<Tensor, BayesRustError> {
        let rank = self.rank();
        let mut reduce = vec![false; rank];
        match axes {
            None => reduce.iter_mut().for_each(|r| *r = true),
            Some(axes) => {
                for &axis in axes {
                    if axis >= rank {
                        return Err(BayesRustError::InvalidAxis { axis, rank });
                    }
                    reduce[axis] = true;
                }
            }
        }

        let kept_shape: Vec<usize> = self
            .shape()
            .iter()
            .zip(&reduce)
            .map(|(&d, &r)| if r { 1 } else { d })
            .collect();
        let kept_strides = calculate_strides(&kept_shape);
        let in_strides = self.strides();
        let mut out = vec![0.0; kept_shape.iter().product()];

        for (i, &value) in self.data().iter().enumerate() {
            let coord = index_to_coord(i, in_strides, self.shape());
            let out_index: usize = coord
                .iter()
                .zip(&reduce)
                .zip(&kept_strides)
                .map(|((&c, &r), &s)| if r { 0 } else { c * s })
                .sum();
            out[out_index] += value;
        }

        let out_shape = if keep_dims {
            kept_shape
        } else {
            self.shape()
                .iter()
                .zip(&reduce)
                .filter(|(_, r)| !**r)
                .map(|(&d, _)| d)
                .collect()
        };
        Ok(Tensor::from_parts(out, out_shape, DType::F64))
    }

    /// Sum of every element.
    pub fn sum_all(&self) -> f64 {
        self.data().iter().sum()
    }

    /// Mean over `axes` (all axes when `None`).
    pub fn mean(&self, axes: Option<&[usize]>, keep_dims: bool) -> Result<Tensor, BayesRustError> {
        let count: usize = match axes {
            None => self.numel(),
            Some(axes) => axes.iter().filter_map(|&a| self.shape().get(a)).product(),
        };
        let summed = self.sum(axes, keep_dims)?;
        Ok(summed.mul_scalar(1.0 / count as f64))
    }

    pub fn mean_all(&self) -> f64 {
        self.sum_all() / self.numel() as f64
    }
}

#[cfg(test)]
#[path = "reduction_test.rs"]
mod tests;
