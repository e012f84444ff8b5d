use approx::assert_relative_eq;
use bayesrust_core::distributions::Distribution;
use bayesrust_core::{BayesianNetwork, Differentiator, Graph, Tensor};

mod common;
use common::{init_logging, latent_gaussian};

#[test]
fn test_product_plus_sum_partials() {
    init_logging();
    let mut graph = Graph::new();
    let a = latent_gaussian(&mut graph, Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap());
    let b = latent_gaussian(&mut graph, Tensor::scalar(4.0));
    let c = latent_gaussian(&mut graph, Tensor::new(vec![0.5; 6], vec![2, 3]).unwrap());
    let ab = graph.mul(a, b).unwrap();
    let sum_c = graph.sum(c).unwrap();
    let f = graph.add(ab, sum_c).unwrap();

    let dual = Differentiator::calculate_dual(&graph, f).unwrap();
    assert_eq!(dual.value().data(), &[7.0, 11.0, 15.0]);

    // df/da = b * I
    let df_da = dual.partial(a).unwrap();
    assert_eq!(df_da.shape(), &[3, 3]);
    assert_eq!(df_da.data(), &[4.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0]);

    // df/dc is one everywhere for every output element
    let df_dc = dual.partial(c).unwrap();
    assert_eq!(df_dc.shape(), &[3, 2, 3]);
    assert!(df_dc.data().iter().all(|&v| v == 1.0));
}

/// Centred differences of the joint log probability agree with the
/// analytic gradient of a small hierarchical model.
#[test]
fn test_joint_gradient_matches_finite_differences() {
    init_logging();
    let mut graph = Graph::new();
    let mu = graph.gaussian(0.0, 2.0).unwrap();
    graph.set_value(mu, Tensor::scalar(0.3)).unwrap();
    let log_sigma = graph.gaussian(0.0, 1.0).unwrap();
    graph.set_value(log_sigma, Tensor::scalar(-0.2)).unwrap();
    let sigma = graph.exp(log_sigma).unwrap();
    let sigma_v = graph.reshape(sigma, vec![1]).unwrap();
    let mu_v = graph.reshape(mu, vec![1]).unwrap();
    let data = graph
        .add_probabilistic(
            bayesrust_core::graph::DistributionKind::Gaussian { mu: mu_v, sigma: sigma_v },
            Some(vec![4]),
        )
        .unwrap();
    graph
        .observe(data, Tensor::new(vec![0.1, -0.4, 1.2, 0.7], vec![4]).unwrap())
        .unwrap();

    let mut network = BayesianNetwork::new(graph, &[data]).unwrap();
    let gradient = network.log_prob_gradient().unwrap();
    assert_eq!(gradient.len(), 2);

    let eps = 1e-6;
    for latent in [mu, log_sigma] {
        let x = network.value(latent).unwrap().scalar_value().unwrap();
        network.set_and_cascade(latent, Tensor::scalar(x + eps)).unwrap();
        let up = network.joint_log_probability().unwrap();
        network.set_and_cascade(latent, Tensor::scalar(x - eps)).unwrap();
        let down = network.joint_log_probability().unwrap();
        network.set_and_cascade(latent, Tensor::scalar(x)).unwrap();

        let numerical = (up - down) / (2.0 * eps);
        let analytical = gradient[&latent].scalar_value().unwrap();
        assert_relative_eq!(analytical, numerical, max_relative = 1e-5);
    }
}

#[test]
fn test_kernel_matches_vertex_log_prob() {
    let mut graph = Graph::new();
    let x = graph.gamma(0.0, 2.0, 3.0).unwrap();
    graph.set_value(x, Tensor::scalar(4.5)).unwrap();
    let kernel = graph.kernel(x).unwrap();
    let direct = kernel.log_prob(&Tensor::scalar(4.5)).unwrap().sum_all();
    assert_relative_eq!(graph.log_prob(x).unwrap(), direct);
}
