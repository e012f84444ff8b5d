use super::{broadcast_params, construction_error, elementwise, params_for_shape, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::Tensor;

/// Continuous uniform distribution on `[min, max)`.
#[derive(Debug, Clone)]
pub struct Uniform {
    min: Tensor,
    max: Tensor,
}

impl Uniform {
    pub fn new(min: Tensor, max: Tensor) -> Result<Self, BayesRustError> {
        broadcast_params("Uniform", &[&min, &max])?;
        let ordered = max.gt(&min)?;
        if !ordered.all() {
            return Err(construction_error("Uniform", "max must exceed min"));
        }
        Ok(Uniform { min, max })
    }
}

fn in_support(x: f64, min: f64, max: f64) -> bool {
    x >= min && x < max
}

impl Distribution for Uniform {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let params = params_for_shape(&[&self.min, &self.max], shape)?;
        let u = rng.next_double_tensor(shape);
        params[0].add(&params[1].sub(&params[0])?.mul(&u)?)
    }

    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        elementwise(&[x, &self.min, &self.max], |v| {
            if in_support(v[0], v[1], v[2]) {
                -(v[2] - v[1]).ln()
            } else {
                f64::NEG_INFINITY
            }
        })
    }

    /// Outside the support the derivative in `x` points back inside it
    /// (`+inf` below `min`, `-inf` at or above `max`).
    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        let inputs = [x, &self.min, &self.max];
        let d_x = elementwise(&inputs, |v| {
            if v[0] < v[1] {
                f64::INFINITY
            } else if v[0] >= v[2] {
                f64::NEG_INFINITY
            } else {
                0.0
            }
        })?;
        let d_min = elementwise(&inputs, |v| {
            if in_support(v[0], v[1], v[2]) {
                1.0 / (v[2] - v[1])
            } else {
                0.0
            }
        })?;
        Ok(Diffs::new()
            .put(Param::X, d_x)
            .put(Param::Max, d_min.neg())
            .put(Param::Min, d_min))
    }
}
