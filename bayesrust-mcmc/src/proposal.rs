use bayesrust_core::graph::{Graph, VertexId};
use bayesrust_core::{BayesRustError, RandomSource, Tensor};

/// How a new value is proposed for a latent vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProposalDistribution {
    /// Draw from the vertex's own distribution given its parents.
    #[default]
    Prior,
    /// Random walk: current value plus `N(0, sigma^2)` noise. Discrete
    /// vertices fall back to `Prior`.
    Gaussian { sigma: f64 },
}

impl ProposalDistribution {
    pub fn gaussian(sigma: f64) -> Result<Self, BayesRustError> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(BayesRustError::ConstructionError {
                distribution: "GaussianProposal".to_string(),
                reason: format!("sigma must be positive and finite, got {}", sigma),
            });
        }
        Ok(ProposalDistribution::Gaussian { sigma })
    }

    /// The proposal actually used for `id`.
    pub fn resolve(&self, graph: &Graph, id: VertexId) -> Result<ProposalDistribution, BayesRustError> {
        Ok(match self {
            ProposalDistribution::Gaussian { .. } if !graph.dtype(id)?.is_float() => ProposalDistribution::Prior,
            other => *other,
        })
    }

    /// Symmetric proposals need no Hastings correction.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, ProposalDistribution::Gaussian { .. })
    }

    pub fn propose(&self, graph: &Graph, id: VertexId, rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        match self.resolve(graph, id)? {
            ProposalDistribution::Prior => graph.sample(id, rng),
            ProposalDistribution::Gaussian { sigma } => {
                let current = graph.value(id)?;
                let noise = rng.next_gaussian_tensor(current.shape()).mul_scalar(sigma);
                current.add(&noise)
            }
        }
    }

    /// Log density of proposing `value` for `id` in the current state.
    /// Zero for symmetric proposals, whose densities cancel.
    pub fn log_prob(&self, graph: &Graph, id: VertexId, value: &Tensor) -> Result<f64, BayesRustError> {
        match self.resolve(graph, id)? {
            ProposalDistribution::Prior => graph.log_prob_of_value(id, value),
            ProposalDistribution::Gaussian { .. } => Ok(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_requires_positive_sigma() {
        assert!(ProposalDistribution::gaussian(0.0).is_err());
        assert!(ProposalDistribution::gaussian(f64::NAN).is_err());
        assert_eq!(
            ProposalDistribution::gaussian(0.5).unwrap(),
            ProposalDistribution::Gaussian { sigma: 0.5 }
        );
    }

    #[test]
    fn test_discrete_vertices_fall_back_to_prior() {
        let mut graph = Graph::new();
        let coin = graph.bernoulli(0.5).unwrap();
        let x = graph.gaussian(0.0, 1.0).unwrap();
        let walk = ProposalDistribution::Gaussian { sigma: 1.0 };
        assert_eq!(walk.resolve(&graph, coin).unwrap(), ProposalDistribution::Prior);
        assert_eq!(walk.resolve(&graph, x).unwrap(), walk);
    }

    #[test]
    fn test_random_walk_stays_near_current_value() {
        let mut graph = Graph::new();
        let x = graph.gaussian(0.0, 1.0).unwrap();
        graph.set_value(x, Tensor::scalar(100.0)).unwrap();
        let mut rng = RandomSource::seeded(5);
        let walk = ProposalDistribution::Gaussian { sigma: 0.01 };
        let proposed = walk.propose(&graph, x, &mut rng).unwrap().scalar_value().unwrap();
        assert!((proposed - 100.0).abs() < 0.1);
        assert_eq!(walk.log_prob(&graph, x, &Tensor::scalar(proposed)).unwrap(), 0.0);
    }

    #[test]
    fn test_prior_log_prob_is_vertex_density() {
        let mut graph = Graph::new();
        let x = graph.exponential(0.0, 2.0).unwrap();
        let log_q = ProposalDistribution::Prior
            .log_prob(&graph, x, &Tensor::scalar(1.0))
            .unwrap();
        assert_relative_eq!(log_q, -0.5 - 2.0f64.ln(), max_relative = 1e-12);
    }
}
