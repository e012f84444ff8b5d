use super::binomial::x_ln_y;
use super::{construction_error, draw_category, split_categories, validate_simplex, BroadcastIndexer, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::utils::broadcast_all_shapes;
use crate::tensor::Tensor;
use crate::types::DType;
use statrs::function::gamma::ln_gamma;

/// Counts over `k` categories after `n` trials. Probabilities are laid out
/// as `p[category, batch...]` and values as `x[category, batch...]`.
#[derive(Debug, Clone)]
pub struct Multinomial {
    n: Tensor,
    p: Tensor,
}

fn invalid_value(reason: impl Into<String>) -> BayesRustError {
    BayesRustError::InvalidValue {
        distribution: "Multinomial".to_string(),
        reason: reason.into(),
    }
}

impl Multinomial {
    pub fn new(n: Tensor, p: Tensor) -> Result<Self, BayesRustError> {
        validate_simplex(&p, "Multinomial")?;
        if !n.data().iter().all(|&v| v >= 0.0 && v.fract() == 0.0) {
            return Err(construction_error("Multinomial", "n must hold non-negative integers"));
        }
        let (_, batch) = split_categories(p.shape());
        broadcast_all_shapes(&[n.shape(), batch]).map_err(|_| {
            construction_error(
                "Multinomial",
                format!("n shape {:?} does not broadcast with p batch shape {:?}", n.shape(), batch),
            )
        })?;
        Ok(Multinomial { n, p })
    }

    pub fn num_categories(&self) -> usize {
        split_categories(self.p.shape()).0
    }

    /// Shape of one draw: `[k]` followed by the broadcast of `n` and the
    /// batch dimensions of `p`.
    pub fn value_shape(&self) -> Result<Vec<usize>, BayesRustError> {
        let (k, batch) = split_categories(self.p.shape());
        let mut shape = vec![k];
        shape.extend(broadcast_all_shapes(&[self.n.shape(), batch])?);
        Ok(shape)
    }

    fn check_categories(&self, shape: &[usize], operation: &str) -> Result<Vec<usize>, BayesRustError> {
        let k = self.num_categories();
        match split_categories(shape) {
            (found, batch) if !shape.is_empty() && found == k => {
                let (_, p_batch) = split_categories(self.p.shape());
                broadcast_all_shapes(&[batch, self.n.shape(), p_batch])
            }
            _ => Err(BayesRustError::ShapeMismatch {
                expected: vec![k],
                actual: shape.to_vec(),
                operation: operation.to_string(),
            }),
        }
    }
}

impl Distribution for Multinomial {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let out_batch = self.check_categories(shape, "Multinomial::sample")?;
        if out_batch.as_slice() != &shape[1..] {
            return Err(BayesRustError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: self.value_shape()?,
                operation: "Multinomial::sample".to_string(),
            });
        }
        let k = self.num_categories();
        let (_, p_batch) = split_categories(self.p.shape());
        let p_batch_numel: usize = p_batch.iter().product();
        let p_indexer = BroadcastIndexer::new(p_batch, &out_batch);
        let n_indexer = BroadcastIndexer::new(self.n.shape(), &out_batch);
        let batch_numel: usize = out_batch.iter().product();

        let mut counts = vec![0.0; k * batch_numel];
        let mut weights = vec![0.0; k];
        for b in 0..batch_numel {
            let pb = p_indexer.index(b);
            for (c, w) in weights.iter_mut().enumerate() {
                *w = self.p.data()[c * p_batch_numel + pb];
            }
            let trials = self.n.data()[n_indexer.index(b)] as u64;
            for _ in 0..trials {
                let c = draw_category(&weights, rng);
                counts[c * batch_numel + b] += 1.0;
            }
        }
        Tensor::new_with_dtype(counts, shape.to_vec(), DType::I64)
    }

    /// Log probability per batch element.
    ///
    /// # Errors
    /// `ShapeMismatch` when `x` lacks the category axis, `InvalidValue` when
    /// counts are negative, fractional or do not sum to `n`.
    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        let layout = CountLayout::new(self, x)?;
        let mut out = Vec::with_capacity(layout.batch_numel);
        for b in 0..layout.batch_numel {
            let n = layout.n(b);
            let mut total = 0.0;
            let mut lp = ln_gamma(n + 1.0);
            for c in 0..layout.k {
                let count = layout.x(c, b);
                if count < 0.0 || count.fract() != 0.0 {
                    return Err(invalid_value(format!("count {} is not a non-negative integer", count)));
                }
                total += count;
                lp += x_ln_y(count, layout.p(c, b)) - ln_gamma(count + 1.0);
            }
            if total != n {
                return Err(invalid_value(format!("counts sum to {} but n is {}", total, n)));
            }
            out.push(lp);
        }
        Tensor::new(out, layout.batch)
    }

    /// Derivative with respect to `p`, accumulated into the shape of `p`.
    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        let layout = CountLayout::new(self, x)?;
        let mut d_p = vec![0.0; self.p.numel()];
        for b in 0..layout.batch_numel {
            for c in 0..layout.k {
                let count = layout.x(c, b);
                if count != 0.0 {
                    let idx = layout.p_index(c, b);
                    d_p[idx] += count / self.p.data()[idx];
                }
            }
        }
        Ok(Diffs::new().put(Param::P, Tensor::new(d_p, self.p.shape().to_vec())?))
    }
}

/// Index arithmetic shared by the density and its derivative.
struct CountLayout<'a> {
    dist: &'a Multinomial,
    x: &'a Tensor,
    k: usize,
    batch: Vec<usize>,
    batch_numel: usize,
    p_batch_numel: usize,
    x_batch_numel: usize,
    p_indexer: BroadcastIndexer,
    x_indexer: BroadcastIndexer,
    n_indexer: BroadcastIndexer,
}

impl<'a> CountLayout<'a> {
    fn new(dist: &'a Multinomial, x: &'a Tensor) -> Result<Self, BayesRustError> {
        let batch = dist.check_categories(x.shape(), "Multinomial::log_prob")?;
        let (k, p_batch) = split_categories(dist.p.shape());
        let (_, x_batch) = split_categories(x.shape());
        Ok(CountLayout {
            dist,
            x,
            k,
            batch_numel: batch.iter().product(),
            p_batch_numel: p_batch.iter().product(),
            x_batch_numel: x_batch.iter().product(),
            p_indexer: BroadcastIndexer::new(p_batch, &batch),
            x_indexer: BroadcastIndexer::new(x_batch, &batch),
            n_indexer: BroadcastIndexer::new(dist.n.shape(), &batch),
            batch,
        })
    }

    fn n(&self, b: usize) -> f64 {
        self.dist.n.data()[self.n_indexer.index(b)]
    }

    fn x(&self, c: usize, b: usize) -> f64 {
        self.x.data()[c * self.x_batch_numel + self.x_indexer.index(b)]
    }

    fn p_index(&self, c: usize, b: usize) -> usize {
        c * self.p_batch_numel + self.p_indexer.index(b)
    }

    fn p(&self, c: usize, b: usize) -> f64 {
        self.dist.p.data()[self.p_index(c, b)]
    }
}

#[cfg(test)]
#[path = "multinomial_test.rs"]
mod tests;
