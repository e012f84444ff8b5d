//! Distribution kernels: sampling, log density and its partial derivatives
//! for every supported family.

use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::broadcast_utils::broadcast_all;
use crate::tensor::utils::{broadcast_all_shapes, calculate_strides, coord_to_index_broadcasted, index_to_coord};
use crate::tensor::Tensor;
use std::collections::BTreeMap;

pub mod bernoulli;
pub mod binomial;
pub mod categorical;
pub mod exponential;
pub mod gamma;
pub mod gaussian;
pub mod grad_check;
pub mod kde;
pub mod multinomial;
pub mod uniform;

pub use bernoulli::Bernoulli;
pub use binomial::Binomial;
pub use categorical::Categorical;
pub use exponential::Exponential;
pub use gamma::Gamma;
pub use gaussian::Gaussian;
pub use kde::KernelDensity;
pub use multinomial::Multinomial;
pub use uniform::Uniform;

/// Role of an input to a density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Param {
    /// The value being scored.
    X,
    Mu,
    Sigma,
    Location,
    Scale,
    Alpha,
    Min,
    Max,
    P,
    N,
}

/// Partial derivatives of an elementwise log density, keyed by input role.
///
/// Entries have the shape of the broadcast of the value and parameters
/// (the log density's shape), except for parameters that carry an extra
/// category axis where they have the parameter's broadcast shape.
#[derive(Debug, Clone, Default)]
pub struct Diffs {
    entries: BTreeMap<Param, Tensor>,
}

impl Diffs {
    pub fn new() -> Self {
        Diffs::default()
    }

    pub fn put(mut self, param: Param, partial: Tensor) -> Self {
        self.entries.insert(param, partial);
        self
    }

    pub fn get(&self, param: Param) -> Option<&Tensor> {
        self.entries.get(&param)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Param, &Tensor)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parameterised probability kernel.
pub trait Distribution {
    /// Draws a value of `shape`.
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError>;

    /// Elementwise log density of `x`; `-inf` outside the support.
    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError>;

    /// Partial derivatives of `log_prob(x)` with respect to `x` (continuous
    /// families only) and each parameter.
    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError>;
}

/// A concrete kernel of any supported family.
#[derive(Debug, Clone)]
pub enum Kernel {
    Gaussian(Gaussian),
    Uniform(Uniform),
    Exponential(Exponential),
    Gamma(Gamma),
    Bernoulli(Bernoulli),
    Binomial(Binomial),
    Categorical(Categorical),
    Multinomial(Multinomial),
    KernelDensity(KernelDensity),
}

impl Distribution for Kernel {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        match self {
            Kernel::Gaussian(d) => d.sample(shape, rng),
            Kernel::Uniform(d) => d.sample(shape, rng),
            Kernel::Exponential(d) => d.sample(shape, rng),
            Kernel::Gamma(d) => d.sample(shape, rng),
            Kernel::Bernoulli(d) => d.sample(shape, rng),
            Kernel::Binomial(d) => d.sample(shape, rng),
            Kernel::Categorical(d) => d.sample(shape, rng),
            Kernel::Multinomial(d) => d.sample(shape, rng),
            Kernel::KernelDensity(d) => d.sample(shape, rng),
        }
    }

    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        match self {
            Kernel::Gaussian(d) => d.log_prob(x),
            Kernel::Uniform(d) => d.log_prob(x),
            Kernel::Exponential(d) => d.log_prob(x),
            Kernel::Gamma(d) => d.log_prob(x),
            Kernel::Bernoulli(d) => d.log_prob(x),
            Kernel::Binomial(d) => d.log_prob(x),
            Kernel::Categorical(d) => d.log_prob(x),
            Kernel::Multinomial(d) => d.log_prob(x),
            Kernel::KernelDensity(d) => d.log_prob(x),
        }
    }

    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        match self {
            Kernel::Gaussian(d) => d.d_log_prob(x),
            Kernel::Uniform(d) => d.d_log_prob(x),
            Kernel::Exponential(d) => d.d_log_prob(x),
            Kernel::Gamma(d) => d.d_log_prob(x),
            Kernel::Bernoulli(d) => d.d_log_prob(x),
            Kernel::Binomial(d) => d.d_log_prob(x),
            Kernel::Categorical(d) => d.d_log_prob(x),
            Kernel::Multinomial(d) => d.d_log_prob(x),
            Kernel::KernelDensity(d) => d.d_log_prob(x),
        }
    }
}

pub(crate) fn construction_error(distribution: &str, reason: impl Into<String>) -> BayesRustError {
    BayesRustError::ConstructionError {
        distribution: distribution.to_string(),
        reason: reason.into(),
    }
}

/// Fails unless every element satisfies `check`.
pub(crate) fn require_all<F: Fn(f64) -> bool>(
    tensor: &Tensor,
    distribution: &str,
    reason: &str,
    check: F,
) -> Result<(), BayesRustError> {
    if tensor.data().iter().all(|&v| check(v)) {
        Ok(())
    } else {
        Err(construction_error(distribution, reason))
    }
}

/// Checks that parameter shapes broadcast together and returns the result.
pub(crate) fn broadcast_params(distribution: &str, params: &[&Tensor]) -> Result<Vec<usize>, BayesRustError> {
    let shapes: Vec<&[usize]> = params.iter().map(|p| p.shape()).collect();
    broadcast_all_shapes(&shapes).map_err(|_| {
            construction_error(
                distribution,
                format!(
                    "parameter shapes {:?} do not broadcast",
                    params.iter().map(|p| p.shape().to_vec()).collect::<Vec<_>>()
                ),
            )
        })
}

/// Broadcasts `params` out to a requested sample `shape`, failing if the
/// parameters are larger than it.
pub(crate) fn params_for_shape(params: &[&Tensor], shape: &[usize]) -> Result<Vec<Tensor>, BayesRustError> {
    params.iter().map(|p| p.broadcast_to(shape)).collect()
}

/// Checks that `p` (categories on axis 0) is non-negative and sums to one
/// across axis 0 for every trailing index.
pub(crate) fn validate_simplex(p: &Tensor, distribution: &str) -> Result<(), BayesRustError> {
    if p.rank() == 0 || p.shape()[0] == 0 {
        return Err(construction_error(
            distribution,
            format!("probabilities need a leading category axis, got shape {:?}", p.shape()),
        ));
    }
    require_all(p, distribution, "probabilities must lie in [0, 1]", |v| {
        (0.0..=1.0).contains(&v)
    })?;
    let sums = p.sum(Some(&[0]), false)?;
    if sums.data().iter().all(|s| (s - 1.0).abs() < SIMPLEX_TOLERANCE) {
        Ok(())
    } else {
        Err(construction_error(
            distribution,
            "probabilities must sum to 1 across categories",
        ))
    }
}

/// Applies `f` to each broadcast tuple of `inputs`, producing an F64 tensor
/// of the broadcast shape.
pub(crate) fn elementwise<F>(inputs: &[&Tensor], f: F) -> Result<Tensor, BayesRustError>
where
    F: Fn(&[f64]) -> f64,
{
    let parts = broadcast_all(inputs)?;
    let shape = parts.first().map(|p| p.shape().to_vec()).unwrap_or_default();
    let numel: usize = shape.iter().product();
    let mut values = vec![0.0; parts.len()];
    let mut out = Vec::with_capacity(numel);
    for i in 0..numel {
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.data()[i];
        }
        out.push(f(&values));
    }
    Tensor::new(out, shape)
}

/// Maps flat positions of a broadcast output onto a smaller source tensor.
pub(crate) struct BroadcastIndexer {
    out_shape: Vec<usize>,
    out_strides: Vec<usize>,
    src_shape: Vec<usize>,
    src_strides: Vec<usize>,
}

impl BroadcastIndexer {
    pub(crate) fn new(src_shape: &[usize], out_shape: &[usize]) -> Self {
        BroadcastIndexer {
            out_shape: out_shape.to_vec(),
            out_strides: calculate_strides(out_shape),
            src_shape: src_shape.to_vec(),
            src_strides: calculate_strides(src_shape),
        }
    }

    pub(crate) fn index(&self, i: usize) -> usize {
        let coord = index_to_coord(i, &self.out_strides, &self.out_shape);
        coord_to_index_broadcasted(&coord, &self.src_shape, &self.src_strides)
    }
}

/// Splits a `[k, batch...]` shape into `k` and the batch shape.
pub(crate) fn split_categories(shape: &[usize]) -> (usize, &[usize]) {
    match shape.split_first() {
        Some((&k, batch)) => (k, batch),
        None => (1, &[]),
    }
}

pub(crate) const SIMPLEX_TOLERANCE: f64 = 1e-6;

/// Cumulative-probability draw over category weights. Zero-probability
/// categories are never chosen.
pub(crate) fn draw_category(weights: &[f64], rng: &mut RandomSource) -> usize {
    let u = rng.next_double();
    let mut cumulative = 0.0;
    let mut last_nonzero = 0;
    for (c, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last_nonzero = c;
        if u < cumulative {
            return c;
        }
    }
    last_nonzero
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_category_skips_zero_weights() {
        let mut rng = RandomSource::seeded(3);
        for _ in 0..200 {
            let c = draw_category(&[0.0, 0.5, 0.0, 0.5], &mut rng);
            assert!(c == 1 || c == 3);
        }
    }

    #[test]
    fn test_validate_simplex() {
        let ok = Tensor::new(vec![0.2, 0.5, 0.8, 0.5], vec![2, 2]).unwrap();
        assert!(validate_simplex(&ok, "Categorical").is_ok());
        let bad = Tensor::new(vec![0.2, 0.5, 0.7, 0.5], vec![2, 2]).unwrap();
        assert!(matches!(
            validate_simplex(&bad, "Categorical"),
            Err(BayesRustError::ConstructionError { .. })
        ));
    }

    #[test]
    fn test_diffs_builder() {
        let d = Diffs::new()
            .put(Param::Mu, Tensor::scalar(1.0))
            .put(Param::Sigma, Tensor::scalar(2.0));
        assert_eq!(d.len(), 2);
        assert_eq!(d.get(Param::Sigma).unwrap().scalar_value().unwrap(), 2.0);
        assert!(d.get(Param::X).is_none());
    }
}
