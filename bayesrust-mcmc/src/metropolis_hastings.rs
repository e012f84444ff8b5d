//! Metropolis-Hastings sampling over a Bayesian network.

use crate::network_samples::{NetworkSamples, NetworkState};
use crate::proposal::ProposalDistribution;
use bayesrust_core::graph::VertexId;
use bayesrust_core::{BayesRustError, BayesianNetwork, RandomSource, Tensor};
use log::{debug, info, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Which latent vertices change in one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableSelector {
    /// One vertex per iteration, cycling in topological order.
    #[default]
    RoundRobin,
    /// Every latent vertex at once.
    AllAtOnce,
}

/// Configuration for the Metropolis-Hastings sampler.
#[derive(Debug, Clone)]
pub struct MetropolisHastingsConfig {
    pub proposal: ProposalDistribution,
    pub selector: VariableSelector,
    /// Store the joint log probability with every sample.
    pub record_log_prob: bool,
    /// Log progress every this many iterations. 0 disables it.
    pub log_every: usize,
}

impl Default for MetropolisHastingsConfig {
    fn default() -> Self {
        Self {
            proposal: ProposalDistribution::Prior,
            selector: VariableSelector::RoundRobin,
            record_log_prob: false,
            log_every: 0,
        }
    }
}

impl MetropolisHastingsConfig {
    pub fn with_proposal(mut self, proposal: ProposalDistribution) -> Self {
        self.proposal = proposal;
        self
    }

    pub fn with_selector(mut self, selector: VariableSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_record_log_prob(mut self, record: bool) -> Self {
        self.record_log_prob = record;
        self
    }

    pub fn with_log_every(mut self, interval: usize) -> Self {
        self.log_every = interval;
        self
    }
}

/// Where a chain is within its current iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Initialized,
    Proposing,
    Evaluating,
    Accepted,
    Rejected,
    Terminal,
}

/// Result of a single iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub accepted: bool,
    /// Log acceptance ratio, Hastings correction included.
    pub log_ratio: f64,
    /// Joint log probability after the iteration.
    pub log_prob: f64,
    pub proposed: Vec<VertexId>,
}

/// One Markov chain mutating a network in place.
pub struct MetropolisHastingsChain<'a> {
    network: &'a mut BayesianNetwork,
    config: MetropolisHastingsConfig,
    latent: Vec<VertexId>,
    /// Probabilistic vertices whose density changes when a latent vertex does.
    affected: HashMap<VertexId, Vec<VertexId>>,
    log_prob: f64,
    state: ChainState,
    next_variable: usize,
    steps: usize,
    accepted: usize,
}

impl<'a> MetropolisHastingsChain<'a> {
    /// # Errors
    /// `InvalidState` unless the network's joint log probability is finite;
    /// call `probe_for_non_zero_probability` first.
    pub fn new(network: &'a mut BayesianNetwork, config: MetropolisHastingsConfig) -> Result<Self, BayesRustError> {
        let log_prob = network.joint_log_probability()?;
        if !log_prob.is_finite() {
            return Err(BayesRustError::InvalidState(format!(
                "chain must start from a state with finite probability, joint log probability is {}",
                log_prob
            )));
        }
        let latent = network.latent_vertices().to_vec();
        let mut affected = HashMap::new();
        for &id in &latent {
            affected.insert(id, affected_by(network, id)?);
        }
        Ok(MetropolisHastingsChain {
            network,
            config,
            latent,
            affected,
            log_prob,
            state: ChainState::Initialized,
            next_variable: 0,
            steps: 0,
            accepted: 0,
        })
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn log_prob(&self) -> f64 {
        self.log_prob
    }

    pub fn network(&self) -> &BayesianNetwork {
        self.network
    }

    /// Accepted proposals over iterations so far; 0 before the first step.
    pub fn acceptance_rate(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.accepted as f64 / self.steps as f64
        }
    }

    /// Ends the chain. Further steps fail.
    pub fn finish(&mut self) {
        self.state = ChainState::Terminal;
    }

    fn select(&mut self) -> Vec<VertexId> {
        match self.config.selector {
            VariableSelector::AllAtOnce => self.latent.clone(),
            VariableSelector::RoundRobin => {
                let chosen = self.latent[self.next_variable % self.latent.len()];
                self.next_variable += 1;
                vec![chosen]
            }
        }
    }

    /// Runs one propose, evaluate, accept-or-reject iteration.
    pub fn step(&mut self, rng: &mut RandomSource) -> Result<StepOutcome, BayesRustError> {
        if self.state == ChainState::Terminal {
            return Err(BayesRustError::InvalidState("chain has terminated".to_string()));
        }
        self.steps += 1;
        if self.latent.is_empty() {
            self.accepted += 1;
            self.state = ChainState::Accepted;
            return Ok(StepOutcome {
                accepted: true,
                log_ratio: 0.0,
                log_prob: self.log_prob,
                proposed: Vec::new(),
            });
        }

        self.state = ChainState::Proposing;
        let targets = self.select();
        let scored: BTreeSet<VertexId> = targets
            .iter()
            .flat_map(|t| self.affected.get(t).into_iter().flatten().copied())
            .collect();
        let old_score = self.network.log_prob_of(scored.iter().copied())?;

        let proposal = self.config.proposal;
        let mut previous: Vec<(VertexId, Tensor)> = Vec::with_capacity(targets.len());
        let mut log_q_old = 0.0;
        for &t in &targets {
            let current = self.network.value(t)?.clone();
            log_q_old += proposal.log_prob(self.network.graph(), t, &current)?;
            previous.push((t, current));
        }

        let mut log_q_new = 0.0;
        let mut feasible = true;
        for &t in &targets {
            let value = match proposal.propose(self.network.graph(), t, rng) {
                Ok(value) => value,
                Err(BayesRustError::ConstructionError { .. }) => {
                    feasible = false;
                    break;
                }
                Err(e) => return Err(e),
            };
            log_q_new += proposal.log_prob(self.network.graph(), t, &value)?;
            self.network.set_and_cascade(t, value)?;
        }

        self.state = ChainState::Evaluating;
        let new_score = if feasible {
            self.network.log_prob_of(scored.iter().copied())?
        } else {
            f64::NEG_INFINITY
        };
        let log_ratio = new_score - old_score + log_q_old - log_q_new;
        let accepted = rng.next_open_double().ln() < log_ratio;

        if accepted {
            self.log_prob += new_score - old_score;
            self.accepted += 1;
            self.state = ChainState::Accepted;
        } else {
            for (t, value) in previous.into_iter().rev() {
                self.network.set_and_cascade(t, value)?;
            }
            self.state = ChainState::Rejected;
        }
        trace!(
            "step {}: {:?} {} (log ratio {:.4})",
            self.steps,
            targets,
            if accepted { "accepted" } else { "rejected" },
            log_ratio
        );
        Ok(StepOutcome {
            accepted,
            log_ratio,
            log_prob: self.log_prob,
            proposed: targets,
        })
    }
}

/// The vertex itself plus the probabilistic network members it feeds,
/// directly or through deterministic vertices.
fn affected_by(network: &BayesianNetwork, id: VertexId) -> Result<Vec<VertexId>, BayesRustError> {
    let graph = network.graph();
    let mut sources = vec![id];
    sources.extend(graph.deterministic_descendants(&[id])?);
    let mut affected = BTreeSet::new();
    affected.insert(id);
    for source in sources {
        for &child in graph.children(source)? {
            if graph.is_probabilistic(child)? && network.contains(child) {
                affected.insert(child);
            }
        }
    }
    Ok(affected.into_iter().collect())
}

/// Posterior sampler built from a [`MetropolisHastingsConfig`].
#[derive(Debug, Clone, Default)]
pub struct MetropolisHastings {
    config: MetropolisHastingsConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl MetropolisHastings {
    pub fn new(config: MetropolisHastingsConfig) -> Self {
        MetropolisHastings { config, cancel: None }
    }

    pub fn with_default_config() -> Self {
        MetropolisHastings::default()
    }

    /// Stops the run between iterations once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &MetropolisHastingsConfig {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Runs `iterations` steps and records the values of `targets` after
    /// each one, accepted or not.
    ///
    /// # Errors
    /// `VertexNotFound` if a target is outside the network, `InvalidState`
    /// if the network does not start in a state of finite probability.
    pub fn get_posterior_samples(
        &self,
        network: &mut BayesianNetwork,
        targets: &[VertexId],
        iterations: usize,
        rng: &mut RandomSource,
    ) -> Result<NetworkSamples, BayesRustError> {
        if let Some(&outside) = targets.iter().find(|&&t| !network.contains(t)) {
            return Err(BayesRustError::VertexNotFound(outside));
        }
        let mut chain = MetropolisHastingsChain::new(network, self.config.clone())?;
        let mut samples = NetworkSamples::new(targets);
        debug!(
            "sampling {} target(s) over {} latent vertices for {} iterations",
            targets.len(),
            chain.latent.len(),
            iterations
        );

        for iteration in 0..iterations {
            if self.cancelled() {
                info!("sampling cancelled after {} iterations", iteration);
                break;
            }
            let outcome = chain.step(rng)?;
            let values: BTreeMap<VertexId, Tensor> = targets
                .iter()
                .map(|&t| Ok((t, chain.network().value(t)?.clone())))
                .collect::<Result<_, BayesRustError>>()?;
            let log_prob = self.config.record_log_prob.then_some(outcome.log_prob);
            samples.push(NetworkState::new(values, log_prob))?;

            if self.config.log_every > 0 && (iteration + 1) % self.config.log_every == 0 {
                debug!(
                    "iteration {}: log prob {:.4}, acceptance {:.3}",
                    iteration + 1,
                    chain.log_prob(),
                    chain.acceptance_rate()
                );
            }
        }

        chain.finish();
        samples.set_acceptance_rate(chain.acceptance_rate());
        info!(
            "collected {} samples, acceptance rate {:.3}",
            samples.len(),
            chain.acceptance_rate()
        );
        Ok(samples)
    }
}

#[cfg(test)]
#[path = "metropolis_hastings_test.rs"]
mod tests;
