use super::{DualNumber, Differentiator};
use crate::distributions::{Distribution, Param};
use crate::error::BayesRustError;
use crate::graph::{Graph, VertexId};
use crate::tensor::utils::left_pad_shape;
use crate::tensor::Tensor;
use std::collections::HashMap;

impl Graph {
    /// Gradient of this vertex's summed log density with respect to every
    /// latent vertex it depends on, itself included when latent.
    pub fn d_log_prob(&self, id: VertexId) -> Result<HashMap<VertexId, Tensor>, BayesRustError> {
        let mut memo = HashMap::new();
        self.d_log_prob_with(id, &mut memo)
    }

    pub(crate) fn d_log_prob_with(
        &self,
        id: VertexId,
        memo: &mut HashMap<VertexId, DualNumber>,
    ) -> Result<HashMap<VertexId, Tensor>, BayesRustError> {
        let kind = self.distribution(id)?;
        let vertex = self.vertex(id)?;
        let value = self.value(id)?;
        let diffs = self.kernel(id)?.d_log_prob(value)?;

        let mut gradient = HashMap::new();
        for (param, parent) in kind.params() {
            if !self.vertex(parent)?.is_differentiable() {
                continue;
            }
            let Some(d_param) = diffs.get(param) else {
                continue;
            };
            let parent_dual = Differentiator::calculate_dual_with(self, parent, memo)?;
            let param_rank = parent_dual.value().rank();
            for (&wrt, partial) in parent_dual.partials() {
                accumulate(&mut gradient, wrt, chain(d_param, partial, param_rank)?)?;
            }
        }

        if vertex.is_differentiable() && !vertex.is_observed() {
            if let Some(d_x) = diffs.get(Param::X) {
                accumulate(&mut gradient, id, d_x.sum_to_shape(value.shape())?)?;
            }
        }
        Ok(gradient)
    }
}

/// Contracts an elementwise derivative with a parameter's partial.
///
/// `d` has the broadcast shape `D`; `partial` has shape `P ++ W` where `P`
/// broadcasts to `D`. The result has shape `W`.
fn chain(d: &Tensor, partial: &Tensor, param_rank: usize) -> Result<Tensor, BayesRustError> {
    let (param_shape, wrt_shape) = partial.shape().split_at(param_rank);
    let d_rank = d.rank();

    let mut padded = left_pad_shape(param_shape, d_rank);
    padded.extend_from_slice(wrt_shape);
    let mut expanded_shape = d.shape().to_vec();
    expanded_shape.extend_from_slice(wrt_shape);
    let expanded = partial.reshape(padded)?.broadcast_to(&expanded_shape)?;

    let mut d_shape = d.shape().to_vec();
    d_shape.resize(d_rank + wrt_shape.len(), 1);
    let product = expanded.mul(&d.reshape(d_shape)?)?;

    let leading: Vec<usize> = (0..d_rank).collect();
    product.sum(Some(&leading), false)
}

fn accumulate(
    gradient: &mut HashMap<VertexId, Tensor>,
    wrt: VertexId,
    contribution: Tensor,
) -> Result<(), BayesRustError> {
    let total = match gradient.remove(&wrt) {
        Some(existing) => existing.add(&contribution)?,
        None => contribution,
    };
    gradient.insert(wrt, total);
    Ok(())
}
