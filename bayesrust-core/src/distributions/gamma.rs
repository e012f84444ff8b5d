use super::exponential::sample_standard_exponential;
use super::{broadcast_params, elementwise, params_for_shape, require_all, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::Tensor;
use log::warn;
use statrs::function::gamma::{digamma, ln_gamma};
use std::f64::consts::E;

/// Upper bound on rejection rounds for a single draw.
pub const MAX_REJECTION_ATTEMPTS: usize = 100_000;

/// Gamma distribution with shape `alpha`, shifted by `location` and
/// stretched by `scale`.
///
/// Sampling uses Cheng's rejection method for `alpha > 1`, an exponential
/// draw for `alpha == 1` and Ahrens-Dieter rejection for `alpha < 1`
/// (Saucier, ARL-TR-2168, 5.1.11).
#[derive(Debug, Clone)]
pub struct Gamma {
    location: Tensor,
    scale: Tensor,
    alpha: Tensor,
}

impl Gamma {
    pub fn new(location: Tensor, scale: Tensor, alpha: Tensor) -> Result<Self, BayesRustError> {
        broadcast_params("Gamma", &[&location, &scale, &alpha])?;
        require_all(&scale, "Gamma", "scale must be positive", |s| s > 0.0)?;
        require_all(&alpha, "Gamma", "alpha must be positive", |a| a > 0.0)?;
        Ok(Gamma {
            location,
            scale,
            alpha,
        })
    }
}

fn rejection_exhausted(alpha: f64) -> BayesRustError {
    warn!("gamma rejection sampler exhausted for alpha = {}", alpha);
    BayesRustError::NumericError {
        operation: "Gamma::sample".to_string(),
        reason: format!(
            "no draw accepted after {} attempts (alpha = {})",
            MAX_REJECTION_ATTEMPTS, alpha
        ),
    }
}

/// Unshifted, unit-scale draw. `None` when the round was rejected.
fn standard_round(alpha: f64, rng: &mut RandomSource) -> Option<f64> {
    if alpha < 1.0 {
        let c = 1.0 + alpha / E;
        let p = c * rng.next_open_double();
        if p > 1.0 {
            let y = -((c - p) / alpha).ln();
            (rng.next_double() <= y.powf(alpha - 1.0)).then_some(y)
        } else {
            // Underflows to zero for small alpha.
            let y = p.powf(1.0 / alpha);
            (rng.next_double() <= (-y).exp()).then_some(y)
        }
    } else if alpha == 1.0 {
        Some(sample_standard_exponential(rng))
    } else {
        let a = 1.0 / (2.0 * alpha - 1.0).sqrt();
        let b = alpha - 4.0_f64.ln();
        let q = alpha + 1.0 / a;
        let t: f64 = 4.5;
        let d = 1.0 + t.ln();
        let p1 = rng.next_open_double();
        let p2 = rng.next_open_double();
        let v = a * (p1 / (1.0 - p1)).ln();
        let y = alpha * v.exp();
        let z = p1 * p1 * p2;
        let w = b + q * v - y;
        (w + d - t * z >= 0.0 || w >= z.ln()).then_some(y)
    }
}

/// One draw strictly above `location`. Rounds whose result collapses onto
/// `location` or is not finite count as rejections.
fn sample_one(location: f64, scale: f64, alpha: f64, rng: &mut RandomSource) -> Result<f64, BayesRustError> {
    for _ in 0..MAX_REJECTION_ATTEMPTS {
        if let Some(y) = standard_round(alpha, rng) {
            let x = location + scale * y;
            if x > location && x.is_finite() {
                return Ok(x);
            }
        }
    }
    Err(rejection_exhausted(alpha))
}

impl Distribution for Gamma {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let params = params_for_shape(&[&self.location, &self.scale, &self.alpha], shape)?;
        let (location, scale, alpha) = (params[0].data(), params[1].data(), params[2].data());
        let mut samples = Vec::with_capacity(location.len());
        for i in 0..location.len() {
            samples.push(sample_one(location[i], scale[i], alpha[i], rng)?);
        }
        Tensor::new(samples, shape.to_vec())
    }

    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        elementwise(&[x, &self.location, &self.scale, &self.alpha], |v| {
            let (x, location, scale, alpha) = (v[0], v[1], v[2], v[3]);
            if x <= location {
                return f64::NEG_INFINITY;
            }
            let shifted = x - location;
            (alpha - 1.0) * shifted.ln() - shifted / scale - alpha * scale.ln() - ln_gamma(alpha)
        })
    }

    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        let inputs = [x, &self.location, &self.scale, &self.alpha];
        let d_x = elementwise(&inputs, |v| (v[3] - 1.0) / (v[0] - v[1]) - 1.0 / v[2])?;
        let d_scale = elementwise(&inputs, |v| (v[0] - v[1]) / (v[2] * v[2]) - v[3] / v[2])?;
        let d_alpha = elementwise(&inputs, |v| (v[0] - v[1]).ln() - v[2].ln() - digamma(v[3]))?;
        Ok(Diffs::new()
            .put(Param::Location, d_x.neg())
            .put(Param::X, d_x)
            .put(Param::Scale, d_scale)
            .put(Param::Alpha, d_alpha))
    }
}

#[cfg(test)]
#[path = "gamma_test.rs"]
mod tests;
