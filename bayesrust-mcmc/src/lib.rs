//! Markov-chain Monte Carlo over `bayesrust-core` networks.

pub mod kde;
pub mod metropolis_hastings;
pub mod network_samples;
pub mod proposal;

pub use kde::GaussianKde;
pub use metropolis_hastings::{
    ChainState, MetropolisHastings, MetropolisHastingsChain, MetropolisHastingsConfig, StepOutcome, VariableSelector,
};
pub use network_samples::{NetworkSamples, NetworkState, VertexSamples};
pub use proposal::ProposalDistribution;
