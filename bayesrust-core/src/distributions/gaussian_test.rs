use super::*;
use crate::distributions::grad_check::check_log_prob_gradient;
use approx::assert_relative_eq;

#[test]
fn test_log_prob_standard_normal() {
    let g = Gaussian::new(Tensor::scalar(0.0), Tensor::scalar(1.0)).unwrap();
    let lp = g.log_prob(&Tensor::scalar(0.0)).unwrap();
    assert_relative_eq!(lp.scalar_value().unwrap(), -LN_SQRT_2PI, epsilon = 1e-12);
    let lp = g.log_prob(&Tensor::scalar(1.0)).unwrap();
    assert_relative_eq!(lp.scalar_value().unwrap(), -0.5 - LN_SQRT_2PI, epsilon = 1e-12);
}

#[test]
fn test_log_prob_broadcasts_scalar_params() {
    let g = Gaussian::new(Tensor::scalar(1.0), Tensor::scalar(2.0)).unwrap();
    let x = Tensor::new(vec![1.0, 3.0], vec![2]).unwrap();
    let lp = g.log_prob(&x).unwrap();
    assert_eq!(lp.shape(), &[2]);
    assert_relative_eq!(lp.data()[1] - lp.data()[0], -0.5, epsilon = 1e-12);
}

#[test]
fn test_non_positive_sigma_rejected() {
    let err = Gaussian::new(Tensor::scalar(0.0), Tensor::scalar(0.0)).unwrap_err();
    assert!(matches!(err, BayesRustError::ConstructionError { .. }));
}

#[test]
fn test_gradient_matches_finite_differences() {
    let x = Tensor::new(vec![-0.3, 0.7, 2.1], vec![3]).unwrap();
    let params = [
        (Param::Mu, Tensor::new(vec![0.1, 0.2, 0.3], vec![3]).unwrap()),
        (Param::Sigma, Tensor::scalar(1.3)),
    ];
    check_log_prob_gradient(
        |p| Gaussian::new(p[0].clone(), p[1].clone()),
        &params,
        &x,
        1e-6,
        1e-5,
    )
    .unwrap();
}

#[test]
fn test_sample_moments() {
    let g = Gaussian::new(Tensor::scalar(2.0), Tensor::scalar(0.5)).unwrap();
    let mut rng = RandomSource::seeded(11);
    let draws = g.sample(&[50_000], &mut rng).unwrap();
    let mean = draws.mean_all();
    let var = draws.add_scalar(-mean).square().mean_all();
    assert_relative_eq!(mean, 2.0, epsilon = 0.01);
    assert_relative_eq!(var, 0.25, epsilon = 0.01);
}

#[test]
fn test_sample_rejects_shape_smaller_than_params() {
    let g = Gaussian::new(Tensor::new(vec![0.0, 1.0], vec![2]).unwrap(), Tensor::scalar(1.0)).unwrap();
    let mut rng = RandomSource::seeded(1);
    assert!(g.sample(&[], &mut rng).is_err());
}
