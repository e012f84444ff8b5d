//! A model assembled from a graph: the vertices some root set depends on,
//! split into latent, observed and deterministic parts.

use crate::distributions::Distribution;
use crate::error::BayesRustError;
use crate::graph::{Graph, VertexId};
use crate::random::RandomSource;
use crate::tensor::Tensor;
use log::{debug, trace, warn};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct BayesianNetwork {
    graph: Graph,
    /// Topologically ordered.
    vertices: Vec<VertexId>,
    latent: Vec<VertexId>,
    observed: Vec<VertexId>,
    deterministic: Vec<VertexId>,
}

impl BayesianNetwork {
    /// Builds a network over `roots` and all of their ancestors.
    ///
    /// # Errors
    /// `VertexNotFound` for an unknown root, `CycleDetected` if the parent
    /// relation among the collected vertices is not acyclic.
    pub fn new(graph: Graph, roots: &[VertexId]) -> Result<Self, BayesRustError> {
        let mut members = BTreeSet::new();
        let mut stack = roots.to_vec();
        while let Some(id) = stack.pop() {
            if members.insert(id) {
                stack.extend_from_slice(graph.parents(id)?);
            }
        }
        let vertices = topological_order(&graph, &members)?;
        let mut network = BayesianNetwork {
            graph,
            vertices,
            latent: Vec::new(),
            observed: Vec::new(),
            deterministic: Vec::new(),
        };
        network.partition()?;
        debug!(
            "network of {} vertices: {} latent, {} observed",
            network.vertices.len(),
            network.latent.len(),
            network.observed.len()
        );
        Ok(network)
    }

    /// Network over everything connected to `vertex`.
    pub fn from_connected(graph: Graph, vertex: VertexId) -> Result<Self, BayesRustError> {
        let connected = graph.connected_graph(vertex)?;
        BayesianNetwork::new(graph, &connected)
    }

    fn partition(&mut self) -> Result<(), BayesRustError> {
        self.latent.clear();
        self.observed.clear();
        self.deterministic.clear();
        for &id in &self.vertices {
            let vertex = self.graph.vertex(id)?;
            if vertex.is_deterministic() {
                self.deterministic.push(id);
            } else if vertex.is_observed() {
                self.observed.push(id);
            } else {
                self.latent.push(id);
            }
        }
        Ok(())
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn latent_vertices(&self) -> &[VertexId] {
        &self.latent
    }

    pub fn observed_vertices(&self) -> &[VertexId] {
        &self.observed
    }

    pub fn deterministic_vertices(&self) -> &[VertexId] {
        &self.deterministic
    }

    /// Latent and observed vertices in topological order.
    pub fn probabilistic_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .copied()
            .filter(move |&id| self.graph.vertex(id).map_or(false, |v| v.is_probabilistic()))
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains(&id)
    }

    fn require_member(&self, id: VertexId) -> Result<(), BayesRustError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(BayesRustError::VertexNotFound(id))
        }
    }

    pub fn value(&self, id: VertexId) -> Result<&Tensor, BayesRustError> {
        self.require_member(id)?;
        self.graph.value(id)
    }

    pub fn set_value(&mut self, id: VertexId, value: Tensor) -> Result<(), BayesRustError> {
        self.require_member(id)?;
        self.graph.set_value(id, value)
    }

    pub fn set_and_cascade(&mut self, id: VertexId, value: Tensor) -> Result<Vec<VertexId>, BayesRustError> {
        self.require_member(id)?;
        let updated = self.graph.set_and_cascade(id, value)?;
        self.partition()?;
        Ok(updated)
    }

    pub fn observe(&mut self, id: VertexId, value: Tensor) -> Result<(), BayesRustError> {
        self.require_member(id)?;
        self.graph.observe(id, value)?;
        self.partition()
    }

    pub fn observe_own_value(&mut self, id: VertexId) -> Result<(), BayesRustError> {
        self.require_member(id)?;
        self.graph.observe_own_value(id)?;
        self.partition()
    }

    pub fn unobserve(&mut self, id: VertexId) -> Result<(), BayesRustError> {
        self.require_member(id)?;
        self.graph.unobserve(id)?;
        self.partition()
    }

    /// Log density of one probabilistic vertex at its current value.
    ///
    /// An unset value, or parent values that do not form a valid
    /// distribution, score `-inf`.
    fn score(&self, id: VertexId) -> Result<f64, BayesRustError> {
        let Some(value) = self.graph.vertex(id)?.value() else {
            return Ok(f64::NEG_INFINITY);
        };
        match self.graph.kernel(id) {
            Ok(kernel) => Ok(kernel.log_prob(value)?.sum_all()),
            Err(BayesRustError::ConstructionError { distribution, reason }) => {
                trace!("{} has invalid {} parameters: {}", id, distribution, reason);
                Ok(f64::NEG_INFINITY)
            }
            Err(e) => Err(e),
        }
    }

    /// Sum of the log densities of every probabilistic vertex. Any infeasible
    /// term makes the whole sum `-inf`.
    pub fn joint_log_probability(&self) -> Result<f64, BayesRustError> {
        self.log_prob_of(self.probabilistic_vertices())
    }

    /// Sum of the log densities of the given probabilistic vertices.
    pub fn log_prob_of<I>(&self, vertices: I) -> Result<f64, BayesRustError>
    where
        I: IntoIterator<Item = VertexId>,
    {
        let mut total = 0.0;
        for id in vertices {
            let term = self.score(id)?;
            if term == f64::NEG_INFINITY {
                return Ok(f64::NEG_INFINITY);
            }
            total += term;
        }
        Ok(total)
    }

    /// Gradient of the joint log probability with respect to each latent vertex.
    pub fn log_prob_gradient(&self) -> Result<HashMap<VertexId, Tensor>, BayesRustError> {
        let mut memo = HashMap::new();
        let mut gradient: HashMap<VertexId, Tensor> = HashMap::new();
        let probabilistic: Vec<VertexId> = self.probabilistic_vertices().collect();
        for id in probabilistic {
            for (wrt, partial) in self.graph.d_log_prob_with(id, &mut memo)? {
                if !self.latent.contains(&wrt) {
                    continue;
                }
                let total = match gradient.remove(&wrt) {
                    Some(existing) => existing.add(&partial)?,
                    None => partial,
                };
                gradient.insert(wrt, total);
            }
        }
        Ok(gradient)
    }

    /// Resamples the latent vertices from their priors until the joint log
    /// probability is finite. Returns immediately if it already is.
    ///
    /// # Errors
    /// `NoFeasibleState` once `max_attempts` resamplings have all failed.
    pub fn probe_for_non_zero_probability(
        &mut self,
        max_attempts: usize,
        rng: &mut RandomSource,
    ) -> Result<(), BayesRustError> {
        if self.joint_log_probability()?.is_finite() {
            return Ok(());
        }
        for attempt in 1..=max_attempts {
            if self.resample_latents(rng)? {
                let log_prob = self.joint_log_probability()?;
                debug!("probe attempt {}: joint log probability {}", attempt, log_prob);
                if log_prob.is_finite() {
                    return Ok(());
                }
            }
        }
        warn!("no feasible state after {} attempts", max_attempts);
        Err(BayesRustError::NoFeasibleState { attempts: max_attempts })
    }

    /// Draws every latent vertex from its prior in topological order.
    /// Returns `false` if some prior could not be built from the values
    /// drawn so far.
    fn resample_latents(&mut self, rng: &mut RandomSource) -> Result<bool, BayesRustError> {
        for i in 0..self.latent.len() {
            let id = self.latent[i];
            let value = match self.graph.sample(id, rng) {
                Ok(value) => value,
                Err(BayesRustError::ConstructionError { .. }) => return Ok(false),
                Err(e) => return Err(e),
            };
            self.graph.set_and_cascade(id, value)?;
        }
        Ok(true)
    }
}

/// Kahn's algorithm over `members`, smallest ready id first.
fn topological_order(graph: &Graph, members: &BTreeSet<VertexId>) -> Result<Vec<VertexId>, BayesRustError> {
    let mut in_degree: HashMap<VertexId, usize> = HashMap::new();
    for &id in members {
        let degree = graph.parents(id)?.iter().filter(|p| members.contains(p)).count();
        in_degree.insert(id, degree);
    }
    let mut ready: BTreeSet<VertexId> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut order = Vec::with_capacity(members.len());
    while let Some(id) = ready.pop_first() {
        order.push(id);
        for child in graph.children(id)? {
            if let Some(degree) = in_degree.get_mut(child) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*child);
                }
            }
        }
    }
    if order.len() != members.len() {
        return Err(BayesRustError::CycleDetected);
    }
    Ok(order)
}

#[cfg(test)]
#[path = "network_test.rs"]
mod tests;
