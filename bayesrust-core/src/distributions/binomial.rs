use super::{broadcast_params, elementwise, params_for_shape, require_all, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::Tensor;
use crate::types::DType;
use statrs::function::gamma::ln_gamma;

/// Number of successes in `n` independent trials with success probability `p`.
#[derive(Debug, Clone)]
pub struct Binomial {
    p: Tensor,
    n: Tensor,
}

impl Binomial {
    pub fn new(p: Tensor, n: Tensor) -> Result<Self, BayesRustError> {
        broadcast_params("Binomial", &[&p, &n])?;
        require_all(&p, "Binomial", "probability must lie in [0, 1]", |v| (0.0..=1.0).contains(&v))?;
        require_all(&n, "Binomial", "trial count must be a non-negative integer", |v| {
            v >= 0.0 && v.fract() == 0.0
        })?;
        Ok(Binomial { p, n })
    }
}

/// `k ln p` with the convention `0 ln 0 = 0`.
pub(crate) fn x_ln_y(x: f64, y: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x * y.ln()
    }
}

pub(crate) fn ln_binomial_coefficient(n: f64, k: f64) -> f64 {
    ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)
}

impl Distribution for Binomial {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let params = params_for_shape(&[&self.p, &self.n], shape)?;
        let counts = params[0]
            .data()
            .iter()
            .zip(params[1].data())
            .map(|(&p, &n)| (0..n as u64).filter(|_| rng.next_double() < p).count() as f64)
            .collect();
        Tensor::new_with_dtype(counts, shape.to_vec(), DType::I64)
    }

    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        elementwise(&[x, &self.p, &self.n], |v| {
            let (k, p, n) = (v[0], v[1], v[2]);
            if k.fract() != 0.0 || k < 0.0 || k > n {
                return f64::NEG_INFINITY;
            }
            ln_binomial_coefficient(n, k) + x_ln_y(k, p) + x_ln_y(n - k, 1.0 - p)
        })
    }

    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        let d_p = elementwise(&[x, &self.p, &self.n], |v| {
            let (k, p, n) = (v[0], v[1], v[2]);
            let success = if k == 0.0 { 0.0 } else { k / p };
            let failure = if n == k { 0.0 } else { (n - k) / (1.0 - p) };
            success - failure
        })?;
        Ok(Diffs::new().put(Param::P, d_p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::grad_check::check_log_prob_gradient;
    use crate::tensor::from_ints;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_prob_matches_closed_form() {
        let b = Binomial::new(Tensor::scalar(0.2), from_ints(&[10], vec![]).unwrap()).unwrap();
        let lp = b.log_prob(&from_ints(&[2], vec![]).unwrap()).unwrap();
        let expected = (45.0_f64).ln() + 2.0 * 0.2_f64.ln() + 8.0 * 0.8_f64.ln();
        assert_relative_eq!(lp.scalar_value().unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_out_of_support() {
        let b = Binomial::new(Tensor::scalar(0.5), from_ints(&[3], vec![]).unwrap()).unwrap();
        let lp = b.log_prob(&from_ints(&[-1, 4], vec![2]).unwrap()).unwrap();
        assert!(lp.data().iter().all(|v| *v == f64::NEG_INFINITY));
    }

    #[test]
    fn test_sample_mean() {
        let b = Binomial::new(Tensor::scalar(0.3), from_ints(&[20], vec![]).unwrap()).unwrap();
        let mut rng = RandomSource::seeded(4);
        let s = b.sample(&[20_000], &mut rng).unwrap();
        assert_eq!(s.dtype(), DType::I64);
        assert!(s.data().iter().all(|&k| (0.0..=20.0).contains(&k)));
        assert_relative_eq!(s.mean_all(), 6.0, epsilon = 0.1);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let x = from_ints(&[0, 3, 5], vec![3]).unwrap();
        let params = [
            (Param::P, Tensor::new(vec![0.25, 0.5, 0.7], vec![3]).unwrap()),
            (Param::N, from_ints(&[5], vec![]).unwrap()),
        ];
        // n is discrete; only p is checked.
        check_log_prob_gradient(
            |p| Binomial::new(p[0].clone(), params[1].1.clone()),
            &params[..1],
            &x,
            1e-7,
            1e-5,
        )
        .unwrap();
    }
}
