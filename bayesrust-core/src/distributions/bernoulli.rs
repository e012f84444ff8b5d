use super::{construction_error, elementwise, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::Tensor;

/// Slack allowed when a computed probability lands just outside `[0, 1]`.
const PROBABILITY_SLACK: f64 = 1e-9;

/// Boolean outcome that is true with probability `p`.
#[derive(Debug, Clone)]
pub struct Bernoulli {
    p: Tensor,
}

impl Bernoulli {
    /// `p` is clamped to `[0, 1]`; values further outside than rounding
    /// error, or NaN, are rejected.
    pub fn new(p: Tensor) -> Result<Self, BayesRustError> {
        let valid = p
            .data()
            .iter()
            .all(|&v| v >= -PROBABILITY_SLACK && v <= 1.0 + PROBABILITY_SLACK);
        if !valid {
            return Err(construction_error("Bernoulli", "probability must lie in [0, 1]"));
        }
        Ok(Bernoulli { p: p.clamp(0.0, 1.0) })
    }

    pub fn probability(&self) -> &Tensor {
        &self.p
    }
}

impl Distribution for Bernoulli {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let p = self.p.broadcast_to(shape)?;
        rng.next_double_tensor(shape).lt(&p)
    }

    /// `ln p` where true, `ln(1 - p)` where false; values other than 0 or 1
    /// are outside the support.
    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        let blended = Tensor::where_mask(x, &self.p.ln(), &self.p.rsub_scalar(1.0).ln())?;
        let binary = x
            .eq_elem(&Tensor::scalar(1.0))?
            .logical_or(&x.eq_elem(&Tensor::scalar(0.0))?)?;
        blended.masked_fill(&binary.logical_not(), f64::NEG_INFINITY)
    }

    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        let d_p = elementwise(&[x, &self.p], |v| {
            if v[0] != 0.0 {
                1.0 / v[1]
            } else {
                -1.0 / (1.0 - v[1])
            }
        })?;
        Ok(Diffs::new().put(Param::P, d_p))
    }
}
