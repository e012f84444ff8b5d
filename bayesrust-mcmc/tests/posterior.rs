//! Conjugate Gaussian model with a closed-form posterior.

use bayesrust_core::{BayesianNetwork, Graph, RandomSource, Tensor, VertexId};
use bayesrust_mcmc::{GaussianKde, MetropolisHastings, MetropolisHastingsConfig, NetworkSamples, ProposalDistribution};

mod common;
use common::init_logging;

const OBSERVATIONS: [f64; 5] = [1.0, 2.0, 1.5, 0.5, 1.0];
// mu ~ N(0, 1), y ~ N(mu, 1): precision 1 + n, mean sum(y) / (1 + n).
const POSTERIOR_MEAN: f64 = 1.0;
const POSTERIOR_VARIANCE: f64 = 1.0 / 6.0;

fn model() -> (BayesianNetwork, VertexId) {
    let mut graph = Graph::new();
    let mu = graph.gaussian(0.0, 1.0).unwrap();
    graph.set_label(mu, "mu").unwrap();
    let data: Vec<VertexId> = OBSERVATIONS.iter().map(|_| graph.gaussian(mu, 1.0).unwrap()).collect();

    let mut network = BayesianNetwork::from_connected(graph, mu).unwrap();
    for (&id, &y) in data.iter().zip(OBSERVATIONS.iter()) {
        network.observe(id, Tensor::scalar(y)).unwrap();
    }
    (network, mu)
}

fn posterior(proposal: ProposalDistribution, seed: u64) -> (NetworkSamples, VertexId) {
    init_logging();
    let mut rng = RandomSource::seeded(seed);
    let (mut network, mu) = model();
    assert_eq!(network.latent_vertices(), &[mu]);
    network.probe_for_non_zero_probability(10, &mut rng).unwrap();

    let config = MetropolisHastingsConfig::default()
        .with_proposal(proposal)
        .with_log_every(5_000);
    let samples = MetropolisHastings::new(config)
        .get_posterior_samples(&mut network, &[mu], 20_000, &mut rng)
        .unwrap()
        .drop(2_000);
    (samples, mu)
}

fn assert_moments(samples: &NetworkSamples, mu: VertexId) {
    let trace = samples.get(mu).unwrap();
    let mean = trace.mean().unwrap().scalar_value().unwrap();
    let variance = trace.variance().unwrap().scalar_value().unwrap();
    assert!((mean - POSTERIOR_MEAN).abs() < 0.05, "mean {}", mean);
    assert!((variance - POSTERIOR_VARIANCE).abs() < 0.03, "variance {}", variance);
}

#[test]
fn test_gaussian_random_walk_recovers_posterior() {
    let (samples, mu) = posterior(ProposalDistribution::gaussian(0.5).unwrap(), 11);
    assert_eq!(samples.len(), 18_000);
    let rate = samples.acceptance_rate().unwrap();
    assert!(rate > 0.2 && rate < 0.95, "acceptance rate {}", rate);
    assert_moments(&samples, mu);
}

#[test]
fn test_prior_proposal_recovers_posterior() {
    let (samples, mu) = posterior(ProposalDistribution::Prior, 12);
    assert_moments(&samples, mu);
}

#[test]
fn test_kde_of_posterior_trace() {
    let (samples, mu) = posterior(ProposalDistribution::gaussian(0.5).unwrap(), 13);
    let kde = GaussianKde::new().approximate_vertex(&samples.down_sample(4).unwrap(), mu).unwrap();
    assert_eq!(kde.points().len(), 4_500);

    let peak = (2.0 * std::f64::consts::PI * POSTERIOR_VARIANCE).sqrt().recip();
    let density = kde.pdf(&Tensor::scalar(POSTERIOR_MEAN)).unwrap().scalar_value().unwrap();
    assert!((density - peak).abs() < 0.1, "density {} vs {}", density, peak);

    let tail = kde.pdf(&Tensor::scalar(POSTERIOR_MEAN + 3.0)).unwrap().scalar_value().unwrap();
    assert!(tail < 0.01, "tail density {}", tail);

    // The fitted density can stand in for the posterior in a new model.
    let mut graph = Graph::new();
    let prior = graph.kernel_density(kde).unwrap();
    let mut rng = RandomSource::seeded(14);
    let draw = graph.sample(prior, &mut rng).unwrap();
    assert!(draw.scalar_value().unwrap().is_finite());
}
