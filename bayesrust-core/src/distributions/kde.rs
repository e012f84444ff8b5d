use super::{construction_error, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::Tensor;

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Gaussian kernel density estimate over a set of scalar sample points.
///
/// The density of `x` is `1/N * sum_i phi((x - s_i) / h) / h`.
#[derive(Debug, Clone)]
pub struct KernelDensity {
    points: Vec<f64>,
    bandwidth: f64,
}

impl KernelDensity {
    pub fn new(points: Vec<f64>, bandwidth: f64) -> Result<Self, BayesRustError> {
        if points.is_empty() {
            return Err(construction_error("KernelDensity", "at least one sample point is required"));
        }
        if !(bandwidth > 0.0 && bandwidth.is_finite()) {
            return Err(construction_error(
                "KernelDensity",
                format!("bandwidth must be positive and finite, got {}", bandwidth),
            ));
        }
        Ok(KernelDensity { points, bandwidth })
    }

    /// Bandwidth from Scott's rule, `1.06 * std * n^(-1/5)`.
    pub fn scott_bandwidth(points: &[f64]) -> f64 {
        let n = points.len() as f64;
        let mean = points.iter().sum::<f64>() / n;
        let variance = points.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / n;
        1.06 * variance.sqrt() * n.powf(-0.2)
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Shape of the stored sample set, `[1, N]`.
    pub fn sample_shape(&self) -> Vec<usize> {
        vec![1, self.points.len()]
    }

    /// Replaces the stored points with `n` draws from the current estimate.
    ///
    /// # Errors
    /// `ConstructionError` if `n` is zero; the points are left unchanged.
    pub fn resample(&mut self, n: usize, rng: &mut RandomSource) -> Result<(), BayesRustError> {
        if n == 0 {
            return Err(construction_error("KernelDensity", "cannot resample to zero sample points"));
        }
        let draws = self.sample(&[n], rng)?;
        self.points = draws.to_vec();
        Ok(())
    }

    pub fn pdf(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        Ok(self.log_prob(x)?.exp())
    }

    /// `ln sum_i exp(-z_i^2 / 2)` for `z_i = (x - s_i) / h`, with the
    /// softmax-weighted mean of `-z_i / h` as its derivative in `x`.
    fn log_kernel_sum(&self, x: f64) -> (f64, f64) {
        let h = self.bandwidth;
        let exponents: Vec<f64> = self
            .points
            .iter()
            .map(|s| {
                let z = (x - s) / h;
                -0.5 * z * z
            })
            .collect();
        let max = exponents.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut total = 0.0;
        let mut slope = 0.0;
        for (e, s) in exponents.iter().zip(&self.points) {
            let w = (e - max).exp();
            total += w;
            slope += w * -(x - s) / (h * h);
        }
        (max + total.ln(), slope / total)
    }
}

impl Distribution for KernelDensity {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let numel: usize = shape.iter().product();
        let draws = (0..numel)
            .map(|_| {
                let centre = self.points[rng.next_index(self.points.len())];
                centre + self.bandwidth * rng.next_gaussian()
            })
            .collect();
        Tensor::new(draws, shape.to_vec())
    }

    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        let norm = (self.points.len() as f64).ln() + self.bandwidth.ln() + LN_SQRT_2PI;
        Ok(x.map(|v| self.log_kernel_sum(v).0 - norm))
    }

    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        Ok(Diffs::new().put(Param::X, x.map(|v| self.log_kernel_sum(v).1)))
    }
}
