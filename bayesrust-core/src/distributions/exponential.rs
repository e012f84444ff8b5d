use super::{broadcast_params, elementwise, params_for_shape, require_all, Diffs, Distribution, Param};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::Tensor;

/// Exponential distribution shifted to start at `location`.
#[derive(Debug, Clone)]
pub struct Exponential {
    location: Tensor,
    scale: Tensor,
}

impl Exponential {
    pub fn new(location: Tensor, scale: Tensor) -> Result<Self, BayesRustError> {
        broadcast_params("Exponential", &[&location, &scale])?;
        require_all(&scale, "Exponential", "scale must be positive", |s| s > 0.0)?;
        Ok(Exponential { location, scale })
    }
}

/// Unit-rate exponential draw by inversion, always positive.
pub(crate) fn sample_standard_exponential(rng: &mut RandomSource) -> f64 {
    -rng.next_open_double().ln()
}

impl Distribution for Exponential {
    fn sample(&self, shape: &[usize], rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let params = params_for_shape(&[&self.location, &self.scale], shape)?;
        let numel: usize = shape.iter().product();
        let standard = (0..numel).map(|_| sample_standard_exponential(rng)).collect();
        params[0].add(&params[1].mul(&Tensor::new(standard, shape.to_vec())?)?)
    }

    fn log_prob(&self, x: &Tensor) -> Result<Tensor, BayesRustError> {
        elementwise(&[x, &self.location, &self.scale], |v| {
            let (x, location, scale) = (v[0], v[1], v[2]);
            if x < location {
                f64::NEG_INFINITY
            } else {
                -(x - location) / scale - scale.ln()
            }
        })
    }

    fn d_log_prob(&self, x: &Tensor) -> Result<Diffs, BayesRustError> {
        let inputs = [x, &self.location, &self.scale];
        let d_location = elementwise(&inputs, |v| if v[0] < v[1] { 0.0 } else { 1.0 / v[2] })?;
        let d_scale = elementwise(&inputs, |v| {
            if v[0] < v[1] {
                0.0
            } else {
                (v[0] - v[1] - v[2]) / (v[2] * v[2])
            }
        })?;
        Ok(Diffs::new()
            .put(Param::X, d_location.neg())
            .put(Param::Location, d_location)
            .put(Param::Scale, d_scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::grad_check::check_log_prob_gradient;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_prob() {
        let e = Exponential::new(Tensor::scalar(1.0), Tensor::scalar(2.0)).unwrap();
        let lp = e.log_prob(&Tensor::new(vec![3.0, 0.5], vec![2]).unwrap()).unwrap();
        assert_relative_eq!(lp.data()[0], -1.0 - 2.0_f64.ln(), epsilon = 1e-12);
        assert_eq!(lp.data()[1], f64::NEG_INFINITY);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let x = Tensor::new(vec![1.5, 4.0], vec![2]).unwrap();
        let params = [(Param::Location, Tensor::scalar(0.5)), (Param::Scale, Tensor::scalar(1.7))];
        check_log_prob_gradient(
            |p| Exponential::new(p[0].clone(), p[1].clone()),
            &params,
            &x,
            1e-6,
            1e-5,
        )
        .unwrap();
    }

    #[test]
    fn test_sample_mean() {
        let e = Exponential::new(Tensor::scalar(1.0), Tensor::scalar(2.0)).unwrap();
        let mut rng = RandomSource::seeded(9);
        let s = e.sample(&[50_000], &mut rng).unwrap();
        assert!(s.data().iter().all(|&v| v > 1.0));
        assert_relative_eq!(s.mean_all(), 3.0, epsilon = 0.05);
    }

    #[test]
    fn test_scale_must_be_positive() {
        assert!(Exponential::new(Tensor::scalar(0.0), Tensor::scalar(-1.0)).is_err());
    }
}
