use super::DualNumber;
use crate::error::BayesRustError;
use crate::graph::{DeterministicOp, Graph, VertexId, VertexKind};
use crate::tensor::{zeros, Tensor};
use log::trace;
use std::collections::HashMap;

/// Computes dual numbers by walking the graph dependency-first.
///
/// The walk uses an explicit stack, so deep chains do not recurse. Parents
/// that are not real-valued are treated as constants. Probabilistic vertices
/// are leaves: a latent one carries the identity partial with respect to
/// itself, an observed one carries none.
pub struct Differentiator;

impl Differentiator {
    pub fn calculate_dual(graph: &Graph, id: VertexId) -> Result<DualNumber, BayesRustError> {
        let mut memo = HashMap::new();
        Self::calculate_dual_with(graph, id, &mut memo)
    }

    /// Like [`calculate_dual`](Self::calculate_dual), reusing and extending
    /// `memo` so vertices shared between several targets are visited once.
    pub fn calculate_dual_with(
        graph: &Graph,
        id: VertexId,
        memo: &mut HashMap<VertexId, DualNumber>,
    ) -> Result<DualNumber, BayesRustError> {
        graph.vertex(id)?;
        let mut stack = vec![id];
        while let Some(&head) = stack.last() {
            if memo.contains_key(&head) {
                stack.pop();
                continue;
            }
            let vertex = graph.vertex(head)?;
            let pending: Vec<VertexId> = if vertex.is_probabilistic() {
                Vec::new()
            } else {
                vertex
                    .parents()
                    .iter()
                    .copied()
                    .filter(|&p| !memo.contains_key(&p) && graph.vertex(p).map_or(false, |v| v.is_differentiable()))
                    .collect()
            };
            if pending.is_empty() {
                stack.pop();
                let dual = Self::dual_of(graph, head, memo)?;
                trace!("dual of {} has {} partial(s)", head, dual.partials().len());
                memo.insert(head, dual);
            } else {
                stack.extend(pending);
            }
        }
        memo.get(&id)
            .cloned()
            .ok_or_else(|| BayesRustError::InternalError(format!("dual number of {} missing after traversal", id)))
    }

    /// d`of`/d`wrt` for each vertex in `wrt`, zeros where `of` does not depend on it.
    pub fn partials_of(
        graph: &Graph,
        of: VertexId,
        wrt: &[VertexId],
    ) -> Result<HashMap<VertexId, Tensor>, BayesRustError> {
        let dual = Self::calculate_dual(graph, of)?;
        wrt.iter()
            .map(|&w| {
                let partial = match dual.partial(w) {
                    Some(partial) => partial.clone(),
                    None => {
                        let mut shape = dual.value().shape().to_vec();
                        shape.extend_from_slice(graph.value(w)?.shape());
                        zeros(&shape)
                    }
                };
                Ok((w, partial))
            })
            .collect()
    }

    /// Applies the rule of a single vertex. Differentiable parents must
    /// already be in `memo`.
    fn dual_of(
        graph: &Graph,
        id: VertexId,
        memo: &HashMap<VertexId, DualNumber>,
    ) -> Result<DualNumber, BayesRustError> {
        let vertex = graph.vertex(id)?;
        let op = match vertex.kind() {
            VertexKind::Probabilistic(_) => {
                let value = graph.value(id)?.clone();
                return Ok(if vertex.is_observed() || !vertex.is_differentiable() {
                    DualNumber::constant(value)
                } else {
                    DualNumber::with_respect_to_self(id, value)
                });
            }
            VertexKind::Deterministic(op) => op,
        };

        let parents = vertex.parents();
        let operand = |i: usize| -> Result<DualNumber, BayesRustError> {
            match memo.get(&parents[i]) {
                Some(dual) => Ok(dual.clone()),
                None => Ok(DualNumber::constant(graph.get_value(parents[i])?)),
            }
        };

        match op {
            DeterministicOp::Constant(value) => Ok(DualNumber::constant(value.clone())),
            DeterministicOp::Add => operand(0)?.add(&operand(1)?),
            DeterministicOp::Sub => operand(0)?.sub(&operand(1)?),
            DeterministicOp::Mul => operand(0)?.mul(&operand(1)?),
            DeterministicOp::Div => operand(0)?.div(&operand(1)?),
            DeterministicOp::Pow => operand(0)?.pow(&operand(1)?),
            DeterministicOp::Neg => operand(0)?.neg(),
            DeterministicOp::Exp => operand(0)?.exp(),
            DeterministicOp::Ln => operand(0)?.ln(),
            DeterministicOp::Sum { axes } => operand(0)?.sum(axes.as_deref()),
            DeterministicOp::Reshape(shape) => operand(0)?.reshape(shape.clone()),
            DeterministicOp::Pluck(index) => operand(0)?.pluck(index),
            DeterministicOp::Concat { axis } => {
                let parts = (0..parents.len()).map(&operand).collect::<Result<Vec<_>, _>>()?;
                let refs: Vec<&DualNumber> = parts.iter().collect();
                DualNumber::concat(&refs, *axis)
            }
            DeterministicOp::If => {
                let mask = graph.get_value(parents[0])?;
                DualNumber::if_then_else(&mask, &operand(1)?, &operand(2)?)
            }
            DeterministicOp::And
            | DeterministicOp::Or
            | DeterministicOp::Not
            | DeterministicOp::GreaterThan
            | DeterministicOp::LessThan
            | DeterministicOp::Cast(_) => Err(BayesRustError::UnsupportedDifferentiation {
                vertex: id,
                operation: op.name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "differentiator_test.rs"]
mod tests;
