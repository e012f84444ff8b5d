//! Sample traces produced by a sampler run.

use bayesrust_core::graph::VertexId;
use bayesrust_core::{BayesRustError, Tensor};
use std::collections::BTreeMap;

/// The tracked vertex values of one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    values: BTreeMap<VertexId, Tensor>,
    log_prob: Option<f64>,
}

impl NetworkState {
    pub fn new(values: BTreeMap<VertexId, Tensor>, log_prob: Option<f64>) -> Self {
        NetworkState { values, log_prob }
    }

    pub fn get(&self, id: VertexId) -> Option<&Tensor> {
        self.values.get(&id)
    }

    pub fn value(&self, id: VertexId) -> Result<&Tensor, BayesRustError> {
        self.values.get(&id).ok_or(BayesRustError::VertexNotInTrace(id))
    }

    /// Joint log probability at this iteration, when recorded.
    pub fn log_prob(&self) -> Option<f64> {
        self.log_prob
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.values.keys().copied()
    }
}

/// An append-only trace of [`NetworkState`]s over a fixed set of vertices,
/// stored per vertex.
#[derive(Debug, Clone, Default)]
pub struct NetworkSamples {
    series: BTreeMap<VertexId, Vec<Tensor>>,
    log_probs: Option<Vec<f64>>,
    len: usize,
    acceptance_rate: Option<f64>,
}

impl NetworkSamples {
    /// An empty trace tracking `vertex_ids`.
    pub fn new(vertex_ids: &[VertexId]) -> Self {
        NetworkSamples {
            series: vertex_ids.iter().map(|&id| (id, Vec::new())).collect(),
            log_probs: None,
            len: 0,
            acceptance_rate: None,
        }
    }

    /// Appends one iteration. The state must hold exactly the tracked
    /// vertices, and must carry a log probability if and only if the
    /// earlier states do.
    pub fn push(&mut self, state: NetworkState) -> Result<(), BayesRustError> {
        if let Some(missing) = self.series.keys().find(|id| !state.values.contains_key(id)) {
            return Err(BayesRustError::VertexNotInTrace(*missing));
        }
        if let Some(extra) = state.values.keys().find(|id| !self.series.contains_key(id)) {
            return Err(BayesRustError::InvalidState(format!("{} is not tracked by this trace", extra)));
        }
        let mixed = || {
            BayesRustError::InvalidState("log probabilities must be recorded for every sample or none".to_string())
        };
        match state.log_prob {
            Some(lp) => {
                if let Some(log_probs) = &mut self.log_probs {
                    log_probs.push(lp);
                } else if self.len == 0 {
                    self.log_probs = Some(vec![lp]);
                } else {
                    return Err(mixed());
                }
            }
            None if self.log_probs.is_some() => return Err(mixed()),
            None => {}
        }
        for (id, value) in state.values {
            if let Some(series) = self.series.get_mut(&id) {
                series.push(value);
            }
        }
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.series.keys().copied()
    }

    pub fn log_probs(&self) -> Option<&[f64]> {
        self.log_probs.as_deref()
    }

    /// Fraction of accepted proposals in the run that produced this trace.
    pub fn acceptance_rate(&self) -> Option<f64> {
        self.acceptance_rate
    }

    pub(crate) fn set_acceptance_rate(&mut self, rate: f64) {
        self.acceptance_rate = Some(rate);
    }

    /// The trace without its first `k` samples.
    pub fn drop(&self, k: usize) -> NetworkSamples {
        self.retain(|i| i >= k)
    }

    /// Every `interval`-th sample, starting with the first.
    pub fn down_sample(&self, interval: usize) -> Result<NetworkSamples, BayesRustError> {
        if interval == 0 {
            return Err(BayesRustError::InvalidState("down-sample interval must be positive".to_string()));
        }
        Ok(self.retain(|i| i % interval == 0))
    }

    fn retain<F: Fn(usize) -> bool>(&self, keep: F) -> NetworkSamples {
        let pick = |values: &[Tensor]| -> Vec<Tensor> {
            values
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, v)| v.clone())
                .collect()
        };
        let series: BTreeMap<VertexId, Vec<Tensor>> =
            self.series.iter().map(|(&id, values)| (id, pick(values))).collect();
        let log_probs = self.log_probs.as_ref().map(|lps| {
            lps.iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, &lp)| lp)
                .collect()
        });
        let len = (0..self.len).filter(|&i| keep(i)).count();
        NetworkSamples {
            series,
            log_probs,
            len,
            acceptance_rate: self.acceptance_rate,
        }
    }

    /// The per-iteration series of one vertex.
    ///
    /// # Errors
    /// `VertexNotInTrace` if the vertex was not tracked.
    pub fn get(&self, id: VertexId) -> Result<VertexSamples, BayesRustError> {
        let values = self.series.get(&id).ok_or(BayesRustError::VertexNotInTrace(id))?;
        Ok(VertexSamples {
            id,
            values: values.clone(),
        })
    }

    /// The `i`-th iteration.
    pub fn state(&self, i: usize) -> Option<NetworkState> {
        if i >= self.len {
            return None;
        }
        let values = self
            .series
            .iter()
            .map(|(&id, values)| (id, values[i].clone()))
            .collect();
        let log_prob = self.log_probs.as_ref().map(|lps| lps[i]);
        Some(NetworkState::new(values, log_prob))
    }

    pub fn states(&self) -> impl Iterator<Item = NetworkState> + '_ {
        (0..self.len).filter_map(move |i| self.state(i))
    }

    /// Fraction of iterations satisfying `predicate`; NaN for an empty trace.
    pub fn probability<F: Fn(&NetworkState) -> bool>(&self, predicate: F) -> f64 {
        let hits = self.states().filter(|s| predicate(s)).count();
        hits as f64 / self.len as f64
    }
}

/// The series of values one vertex took over a trace.
#[derive(Debug, Clone)]
pub struct VertexSamples {
    id: VertexId,
    values: Vec<Tensor>,
}

impl VertexSamples {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[Tensor] {
        &self.values
    }

    /// The values as plain numbers; fails unless every draw holds one element.
    pub fn scalars(&self) -> Result<Vec<f64>, BayesRustError> {
        self.values.iter().map(|v| v.scalar_value()).collect()
    }

    /// Elementwise mean.
    pub fn mean(&self) -> Result<Tensor, BayesRustError> {
        let sum = self.sum()?;
        Ok(sum.mul_scalar(1.0 / self.values.len() as f64))
    }

    /// Elementwise population variance.
    pub fn variance(&self) -> Result<Tensor, BayesRustError> {
        let mean = self.mean()?;
        let mut total = self.values[0].sub(&mean)?.square();
        for value in &self.values[1..] {
            total = total.add(&value.sub(&mean)?.square())?;
        }
        Ok(total.mul_scalar(1.0 / self.values.len() as f64))
    }

    fn sum(&self) -> Result<Tensor, BayesRustError> {
        let (first, rest) = self
            .values
            .split_first()
            .ok_or_else(|| BayesRustError::InvalidState(format!("no samples of {}", self.id)))?;
        let mut total = first.cast(bayesrust_core::DType::F64);
        for value in rest {
            total = total.add(value)?;
        }
        Ok(total)
    }

    /// Fraction of draws satisfying `predicate`; NaN when empty.
    pub fn probability<F: Fn(&Tensor) -> bool>(&self, predicate: F) -> f64 {
        let hits = self.values.iter().filter(|v| predicate(v)).count();
        hits as f64 / self.values.len() as f64
    }

    /// The most frequent value, earliest first on ties.
    pub fn mode(&self) -> Result<Tensor, BayesRustError> {
        let mut counts: Vec<(&Tensor, usize)> = Vec::new();
        for value in &self.values {
            match counts.iter_mut().find(|(seen, _)| *seen == value) {
                Some((_, count)) => *count += 1,
                None => counts.push((value, 1)),
            }
        }
        let mut best: Option<(&Tensor, usize)> = None;
        for (value, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((value, count));
            }
        }
        best.map(|(value, _)| value.clone())
            .ok_or_else(|| BayesRustError::InvalidState(format!("no samples of {}", self.id)))
    }
}

#[cfg(test)]
#[path = "network_samples_test.rs"]
mod tests;
