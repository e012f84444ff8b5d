use super::{construction_error, draw_category, split_categories, validate_simplex, BroadcastIndexer, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::utils::broadcast_shapes;
use crate::tensor::Tensor;
use crate::types::DType;

/// One draw from `k` categories with probabilities laid out as
/// `p[category, batch...]`. Values are category indices.
#[derive(Debug, Clone)]
pub struct Categorical {
    p: Tensor,
}

impl Categorical {
    pub fn new(p: Tensor) -> Result<Self, BayesRustError> {
        validate_simplex(&p, "Categorical")?;
        Ok(Categorical { p })
    }

    pub fn num_categories(&self) -> usize {
        split_categories(self.p.shape()).0
    }

    /// Shape of a single draw: the trailing batch dimensions of `p`.
    pub fn batch_shape(&self) -> &[usize] {
        split_categories(self.p.shape()).1
    }

    fn output_shape(&self, x_shape: &[usize]) -> Result<Vec<usize>, BayesRustError> {
        broadcast_shapes(x_shape, self.batch_shape())
    }
}

impl Distribution for Categorical {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        if self.output_shape(shape)? != shape {
            return Err(BayesRustError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: self.batch_shape().to_vec(),
                operation: "Categorical::sample".to_string(),
            });
        }
        let k = self.num_categories();
        let batch_numel: usize = self.batch_shape().iter().product();
        let indexer = BroadcastIndexer::new(self.batch_shape(), shape);
        let numel: usize = shape.iter().product();
        let mut weights = vec![0.0; k];
        let mut draws = Vec::with_capacity(numel);
        for i in 0..numel {
            let b = indexer.index(i);
            for (c, w) in weights.iter_mut().enumerate() {
                *w = self.p.data()[c * batch_numel + b];
            }
            draws.push(draw_category(&weights, rng) as f64);
        }
        Tensor::new_with_dtype(draws, shape.to_vec(), DType::I64)
    }

    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        let out_shape = self.output_shape(x.shape())?;
        let k = self.num_categories();
        let batch_numel: usize = self.batch_shape().iter().product();
        let p_indexer = BroadcastIndexer::new(self.batch_shape(), &out_shape);
        let x = x.broadcast_to(&out_shape)?;
        let data = x
            .data()
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if c.fract() != 0.0 || c < 0.0 || c >= k as f64 {
                    f64::NEG_INFINITY
                } else {
                    self.p.data()[c as usize * batch_numel + p_indexer.index(i)].ln()
                }
            })
            .collect();
        Tensor::new(data, out_shape)
    }

    /// Derivative with respect to `p`, accumulated into the shape of `p`.
    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        let out_shape = self.output_shape(x.shape())?;
        let k = self.num_categories();
        let batch_numel: usize = self.batch_shape().iter().product();
        let p_indexer = BroadcastIndexer::new(self.batch_shape(), &out_shape);
        let x = x.broadcast_to(&out_shape)?;
        let mut d_p = vec![0.0; self.p.numel()];
        for (i, &c) in x.data().iter().enumerate() {
            if c.fract() == 0.0 && c >= 0.0 && c < k as f64 {
                let idx = c as usize * batch_numel + p_indexer.index(i);
                d_p[idx] += 1.0 / self.p.data()[idx];
            }
        }
        Ok(Diffs::new().put(Param::P, Tensor::new(d_p, self.p.shape().to_vec())?))
    }
}

/// Unbatched categorical over the given category probabilities.
pub fn from_choices(probabilities: &[f64]) -> Result<Categorical, BayesRustError> {
    if probabilities.is_empty() {
        return Err(construction_error("Categorical", "at least one category is required"));
    }
    Categorical::new(Tensor::new(probabilities.to_vec(), vec![probabilities.len()])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::from_ints;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_prob_picks_category_probability() {
        let c = from_choices(&[0.2, 0.3, 0.5]).unwrap();
        let lp = c.log_prob(&from_ints(&[0, 1, 2, 3], vec![4]).unwrap()).unwrap();
        assert_relative_eq!(lp.data()[0], 0.2_f64.ln());
        assert_relative_eq!(lp.data()[1], 0.3_f64.ln());
        assert_relative_eq!(lp.data()[2], 0.5_f64.ln());
        assert_eq!(lp.data()[3], f64::NEG_INFINITY);
    }

    #[test]
    fn test_batched_probabilities() {
        // two categories, batch of 2
        let p = Tensor::new(vec![0.1, 0.6, 0.9, 0.4], vec![2, 2]).unwrap();
        let c = Categorical::new(p).unwrap();
        let lp = c.log_prob(&from_ints(&[1, 0], vec![2]).unwrap()).unwrap();
        assert_relative_eq!(lp.data()[0], 0.9_f64.ln());
        assert_relative_eq!(lp.data()[1], 0.6_f64.ln());
    }

    #[test]
    fn test_sample_frequencies() {
        let c = from_choices(&[0.0, 0.25, 0.75]).unwrap();
        let mut rng = RandomSource::seeded(8);
        let s = c.sample(&[20_000], &mut rng).unwrap();
        assert!(s.data().iter().all(|&v| v == 1.0 || v == 2.0));
        let ones = s.data().iter().filter(|&&v| v == 1.0).count() as f64 / 20_000.0;
        assert_relative_eq!(ones, 0.25, epsilon = 0.02);
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        assert!(from_choices(&[0.2, 0.2]).is_err());
        assert!(from_choices(&[]).is_err());
    }

    #[test]
    fn test_gradient_accumulates_chosen_categories() {
        let x = from_ints(&[2, 0, 2], vec![3]).unwrap();
        let p = Tensor::new(vec![0.2, 0.3, 0.5], vec![3]).unwrap();
        let kernel = Categorical::new(p.clone()).unwrap();
        let analytical = kernel.d_log_prob(&x).unwrap();
        let d_p = analytical.get(Param::P).unwrap();
        assert_relative_eq!(d_p.data()[0], 1.0 / 0.2);
        assert_relative_eq!(d_p.data()[1], 0.0);
        assert_relative_eq!(d_p.data()[2], 2.0 / 0.5);
    }
}
