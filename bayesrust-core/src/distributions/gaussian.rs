use super::{broadcast_params, elementwise, params_for_shape, require_all, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::Tensor;

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Normal distribution with mean `mu` and standard deviation `sigma`.
#[derive(Debug, Clone)]
pub struct Gaussian {
    mu: Tensor,
    sigma: Tensor,
}

impl Gaussian {
    pub fn new(mu: Tensor, sigma: Tensor) -> Result<Self, BayesRustError> {
        broadcast_params("Gaussian", &[&mu, &sigma])?;
        require_all(&sigma, "Gaussian", "sigma must be positive", |s| s > 0.0)?;
        Ok(Gaussian { mu, sigma })
    }

    pub fn mu(&self) -> &Tensor {
        &self.mu
    }

    pub fn sigma(&self) -> &Tensor {
        &self.sigma
    }
}

impl Distribution for Gaussian {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let params = params_for_shape(&[&self.mu, &self.sigma], shape)?;
        let z = rng.next_gaussian_tensor(shape);
        params[0].add(&params[1].mul(&z)?)
    }

    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        elementwise(&[x, &self.mu, &self.sigma], |v| {
            let (x, mu, sigma) = (v[0], v[1], v[2]);
            let z = (x - mu) / sigma;
            -0.5 * z * z - sigma.ln() - LN_SQRT_2PI
        })
    }

    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        let inputs = [x, &self.mu, &self.sigma];
        let d_mu = elementwise(&inputs, |v| (v[0] - v[1]) / (v[2] * v[2]))?;
        let d_x = d_mu.neg();
        let d_sigma = elementwise(&inputs, |v| {
            let diff = v[0] - v[1];
            (diff * diff - v[2] * v[2]) / (v[2] * v[2] * v[2])
        })?;
        Ok(Diffs::new()
            .put(Param::X, d_x)
            .put(Param::Mu, d_mu)
            .put(Param::Sigma, d_sigma))
    }
}

#[cfg(test)]
#[path = "gaussian_test.rs"]
mod tests;
