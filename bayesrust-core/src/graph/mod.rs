//! Arena-backed model graph.
//!
//! Vertices live in a dense `Vec` indexed by `VertexId`. A vertex can only be
//! added once its parents exist, so every id is larger than its parents' ids
//! and the graph is acyclic by construction.

mod builders;
pub mod operators;
pub mod probabilistic;
mod vertex;

pub use builders::ParamArg;
pub use operators::DeterministicOp;
pub use probabilistic::DistributionKind;
pub use vertex::{Vertex, VertexId, VertexKind};

use crate::autodiff::{DualNumber, Differentiator};
use crate::distributions::{Distribution, Kernel};
use crate::error::BayesRustError;
use crate::random::RandomSource;
use crate::tensor::Tensor;
use crate::types::DType;
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    children: Vec<Vec<VertexId>>,
    labels: HashMap<String, VertexId>,
    dual_cache: HashMap<VertexId, DualNumber>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All ids in ascending (topological) order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().map(|v| v.id)
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, BayesRustError> {
        self.vertices.get(id.0).ok_or(BayesRustError::VertexNotFound(id))
    }

    fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex, BayesRustError> {
        self.vertices.get_mut(id.0).ok_or(BayesRustError::VertexNotFound(id))
    }

    pub fn parents(&self, id: VertexId) -> Result<&[VertexId], BayesRustError> {
        Ok(&self.vertex(id)?.parents)
    }

    pub fn children(&self, id: VertexId) -> Result<&[VertexId], BayesRustError> {
        self.vertex(id)?;
        Ok(&self.children[id.0])
    }

    pub fn shape(&self, id: VertexId) -> Result<Option<&[usize]>, BayesRustError> {
        Ok(self.vertex(id)?.shape())
    }

    pub fn dtype(&self, id: VertexId) -> Result<DType, BayesRustError> {
        Ok(self.vertex(id)?.dtype)
    }

    pub fn is_probabilistic(&self, id: VertexId) -> Result<bool, BayesRustError> {
        Ok(self.vertex(id)?.is_probabilistic())
    }

    pub fn is_observed(&self, id: VertexId) -> Result<bool, BayesRustError> {
        Ok(self.vertex(id)?.observed)
    }

    pub fn distribution(&self, id: VertexId) -> Result<&DistributionKind, BayesRustError> {
        match &self.vertex(id)?.kind {
            VertexKind::Probabilistic(kind) => Ok(kind),
            VertexKind::Deterministic(_) => Err(BayesRustError::NotProbabilistic(id)),
        }
    }

    fn operator(&self, id: VertexId) -> Result<&DeterministicOp, BayesRustError> {
        match &self.vertex(id)?.kind {
            VertexKind::Deterministic(op) => Ok(op),
            VertexKind::Probabilistic(_) => Err(BayesRustError::InvalidState(format!(
                "{} is probabilistic and has no operator",
                id
            ))),
        }
    }

    // --- Labels ---

    /// Attaches a unique human-readable label.
    pub fn set_label(&mut self, id: VertexId, label: impl Into<String>) -> Result<(), BayesRustError> {
        let label = label.into();
        if let Some(&existing) = self.labels.get(&label) {
            if existing != id {
                return Err(BayesRustError::InvalidState(format!(
                    "label '{}' already names {}",
                    label, existing
                )));
            }
        }
        let vertex = self.vertex_mut(id)?;
        let previous = vertex.label.replace(label.clone());
        if let Some(previous) = previous {
            self.labels.remove(&previous);
        }
        self.labels.insert(label, id);
        Ok(())
    }

    pub fn find_by_label(&self, label: &str) -> Option<VertexId> {
        self.labels.get(label).copied()
    }

    // --- Construction ---

    fn push_vertex(
        &mut self,
        kind: VertexKind,
        parents: Vec<VertexId>,
        shape: Option<Vec<usize>>,
        dtype: DType,
    ) -> VertexId {
        let id = VertexId(self.vertices.len());
        for parent in &parents {
            self.children[parent.0].push(id);
        }
        self.vertices.push(Vertex {
            id,
            kind,
            parents,
            shape,
            dtype,
            value: None,
            observed: false,
            label: None,
        });
        self.children.push(Vec::new());
        id
    }

    fn check_parents(&self, parents: &[VertexId]) -> Result<(), BayesRustError> {
        match parents.iter().find(|p| p.0 >= self.vertices.len()) {
            Some(&missing) => Err(BayesRustError::VertexNotFound(missing)),
            None => Ok(()),
        }
    }

    /// Adds a constant vertex holding `value`.
    pub fn constant(&mut self, value: Tensor) -> VertexId {
        let shape = value.shape().to_vec();
        let dtype = value.dtype();
        let id = self.push_vertex(
            VertexKind::Deterministic(DeterministicOp::Constant(value.clone())),
            vec![],
            Some(shape),
            dtype,
        );
        self.vertices[id.0].value = Some(value);
        id
    }

    /// Adds a deterministic vertex. Its value is computed immediately when
    /// every parent already has one.
    pub fn add_deterministic(&mut self, op: DeterministicOp, parents: &[VertexId]) -> Result<VertexId, BayesRustError> {
        self.check_parents(parents)?;
        op.check_arity(parents.len())?;
        let shapes: Vec<Option<&[usize]>> = parents.iter().map(|p| self.vertices[p.0].shape()).collect();
        let dtypes: Vec<DType> = parents.iter().map(|p| self.vertices[p.0].dtype).collect();
        let shape = op.output_shape(&shapes)?;
        let dtype = op.output_dtype(&dtypes);
        if let DeterministicOp::Constant(value) = op {
            return Ok(self.constant(value));
        }
        let id = self.push_vertex(VertexKind::Deterministic(op), parents.to_vec(), shape, dtype);
        if parents.iter().all(|p| self.vertices[p.0].value.is_some()) {
            let value = self.calculate(id)?;
            self.set_value(id, value)?;
        }
        trace!("added deterministic vertex {} ({})", id, self.operator(id)?.name());
        Ok(id)
    }

    /// Adds a probabilistic vertex. Without an explicit `shape` the shape is
    /// implied by the parameter shapes. Parameters are validated now if their
    /// values are available.
    pub fn add_probabilistic(
        &mut self,
        kind: DistributionKind,
        shape: Option<Vec<usize>>,
    ) -> Result<VertexId, BayesRustError> {
        let parents = kind.parents();
        self.check_parents(&parents)?;
        let param_shapes: Option<Vec<&[usize]>> = parents.iter().map(|p| self.vertices[p.0].shape()).collect();
        let shape = match (shape, param_shapes) {
            (Some(shape), Some(param_shapes)) => {
                kind.accepts_shape(&shape, &param_shapes)?;
                Some(shape)
            }
            (None, Some(param_shapes)) => Some(kind.default_shape(&param_shapes)?),
            (shape, None) => shape,
        };
        if parents.iter().all(|p| self.vertices[p.0].value.is_some()) {
            let values: Vec<Tensor> = parents
                .iter()
                .filter_map(|p| self.vertices[p.0].value.clone())
                .collect();
            kind.build(&values)?;
        }
        let dtype = kind.value_dtype();
        let name = kind.name();
        let id = self.push_vertex(VertexKind::Probabilistic(kind), parents, shape, dtype);
        trace!("added {} vertex {}", name, id);
        Ok(id)
    }

    /// Adds a probabilistic vertex whose shape stays unresolved until a
    /// value is assigned.
    pub fn add_probabilistic_unshaped(&mut self, kind: DistributionKind) -> Result<VertexId, BayesRustError> {
        let id = self.add_probabilistic(kind, None)?;
        self.vertices[id.0].shape = None;
        Ok(id)
    }

    // --- Values ---

    /// The cached value.
    pub fn value(&self, id: VertexId) -> Result<&Tensor, BayesRustError> {
        self.vertex(id)?.value.as_ref().ok_or(BayesRustError::ValueNotSet(id))
    }

    pub fn has_value(&self, id: VertexId) -> Result<bool, BayesRustError> {
        Ok(self.vertex(id)?.value.is_some())
    }

    /// The cached value, or for an unset deterministic vertex the value
    /// derived from its ancestors. Nothing is cached.
    pub fn get_value(&self, id: VertexId) -> Result<Tensor, BayesRustError> {
        let vertex = self.vertex(id)?;
        if let Some(value) = &vertex.value {
            return Ok(value.clone());
        }
        if vertex.is_probabilistic() {
            return Err(BayesRustError::ValueNotSet(id));
        }

        let mut derived: HashMap<VertexId, Tensor> = HashMap::new();
        let mut stack = vec![id];
        while let Some(&head) = stack.last() {
            if derived.contains_key(&head) {
                stack.pop();
                continue;
            }
            let mut pending = Vec::new();
            for &parent in &self.vertices[head.0].parents {
                let parent_vertex = &self.vertices[parent.0];
                if parent_vertex.value.is_none() && !derived.contains_key(&parent) {
                    if parent_vertex.is_probabilistic() {
                        return Err(BayesRustError::ValueNotSet(parent));
                    }
                    pending.push(parent);
                }
            }
            if pending.is_empty() {
                stack.pop();
                let inputs = self.inputs_of(head, &derived)?;
                let refs: Vec<&Tensor> = inputs.iter().collect();
                let value = self.operator(head)?.compute(&refs)?;
                derived.insert(head, value);
            } else {
                stack.extend(pending);
            }
        }
        derived.remove(&id).ok_or(BayesRustError::ValueNotSet(id))
    }

    /// Parent values, preferring `overrides` over cached values.
    fn inputs_of(&self, id: VertexId, overrides: &HashMap<VertexId, Tensor>) -> Result<Vec<Tensor>, BayesRustError> {
        self.vertices[id.0]
            .parents
            .iter()
            .map(|p| match overrides.get(p) {
                Some(value) => Ok(value.clone()),
                None => self.value(*p).cloned(),
            })
            .collect()
    }

    /// Recomputes a deterministic vertex from its parents' current values
    /// without storing the result.
    pub fn calculate(&self, id: VertexId) -> Result<Tensor, BayesRustError> {
        let op = self.operator(id)?;
        let inputs = self.vertices[id.0]
            .parents
            .iter()
            .map(|&p| self.get_value(p))
            .collect::<Result<Vec<_>, _>>()?;
        let refs: Vec<&Tensor> = inputs.iter().collect();
        op.compute(&refs)
    }

    /// Stores `value`. The dtype must match and, once resolved, so must the
    /// shape. Cached dual numbers of this vertex and its descendants are dropped.
    pub fn set_value(&mut self, id: VertexId, value: Tensor) -> Result<(), BayesRustError> {
        let vertex = self.vertex(id)?;
        if value.dtype() != vertex.dtype {
            return Err(BayesRustError::DTypeMismatch {
                expected: vertex.dtype,
                actual: value.dtype(),
                operation: format!("set_value on {}", id),
            });
        }
        match vertex.shape() {
            Some(shape) if shape != value.shape() => {
                return Err(BayesRustError::ShapeMismatch {
                    expected: shape.to_vec(),
                    actual: value.shape().to_vec(),
                    operation: format!("set_value on {}", id),
                });
            }
            Some(_) => {}
            None => {
                if let VertexKind::Probabilistic(kind) = &vertex.kind {
                    let param_shapes: Option<Vec<&[usize]>> =
                        vertex.parents.iter().map(|p| self.vertices[p.0].shape()).collect();
                    if let Some(param_shapes) = param_shapes {
                        kind.accepts_shape(value.shape(), &param_shapes)?;
                    }
                }
            }
        }
        let vertex = self.vertex_mut(id)?;
        vertex.shape = Some(value.shape().to_vec());
        vertex.value = Some(value);
        self.invalidate_duals(id);
        Ok(())
    }

    /// Sets the value and recomputes every deterministic descendant reachable
    /// without passing through a probabilistic vertex.
    pub fn set_and_cascade(&mut self, id: VertexId, value: Tensor) -> Result<Vec<VertexId>, BayesRustError> {
        self.set_value(id, value)?;
        self.cascade(&[id])
    }

    /// Recomputes the deterministic descendants of `sources` in topological
    /// order and returns them. Descendants with an unset parent are skipped.
    pub fn cascade(&mut self, sources: &[VertexId]) -> Result<Vec<VertexId>, BayesRustError> {
        let order = self.deterministic_descendants(sources)?;
        for &id in &order {
            let ready = self.vertices[id.0]
                .parents
                .iter()
                .all(|p| self.vertices[p.0].value.is_some());
            if !ready {
                trace!("cascade skipped {}: parent value missing", id);
                continue;
            }
            let value = self.calculate(id)?;
            self.set_value(id, value)?;
        }
        Ok(order)
    }

    /// Deterministic vertices downstream of `sources`, stopping at
    /// probabilistic vertices, in ascending order.
    pub fn deterministic_descendants(&self, sources: &[VertexId]) -> Result<Vec<VertexId>, BayesRustError> {
        let mut found = BTreeSet::new();
        let mut stack = Vec::new();
        for &source in sources {
            stack.extend_from_slice(self.children(source)?);
        }
        while let Some(id) = stack.pop() {
            if self.vertices[id.0].is_deterministic() && found.insert(id) {
                stack.extend_from_slice(&self.children[id.0]);
            }
        }
        Ok(found.into_iter().collect())
    }

    /// Ensures `id` and every ancestor it depends on has a value: unset
    /// probabilistic ancestors are sampled, unset deterministic ones computed.
    pub fn lazy_eval(&mut self, id: VertexId, rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        self.vertex(id)?;
        let mut missing = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(v) = stack.pop() {
            if self.vertices[v.0].value.is_none() && missing.insert(v) {
                stack.extend_from_slice(&self.vertices[v.0].parents);
            }
        }
        for v in missing {
            let value = if self.vertices[v.0].is_probabilistic() {
                self.sample(v, rng)?
            } else {
                self.calculate(v)?
            };
            self.set_value(v, value)?;
        }
        self.value(id).cloned()
    }

    /// Draws a fresh value without changing the graph. Probabilistic vertices
    /// sample their own distribution given their parents' current values;
    /// deterministic vertices apply their operator to freshly sampled parents.
    pub fn sample(&self, id: VertexId, rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        if self.vertex(id)?.is_probabilistic() {
            return self.sample_probabilistic(id, rng);
        }
        let mut region = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(v) = stack.pop() {
            if region.insert(v) && self.vertices[v.0].is_deterministic() {
                stack.extend_from_slice(&self.vertices[v.0].parents);
            }
        }
        let mut sampled: HashMap<VertexId, Tensor> = HashMap::new();
        for v in region {
            let value = if self.vertices[v.0].is_probabilistic() {
                self.sample_probabilistic(v, rng)?
            } else {
                let inputs = self.inputs_of(v, &sampled)?;
                let refs: Vec<&Tensor> = inputs.iter().collect();
                self.operator(v)?.compute(&refs)?
            };
            sampled.insert(v, value);
        }
        sampled.remove(&id).ok_or(BayesRustError::ValueNotSet(id))
    }

    fn sample_probabilistic(&self, id: VertexId, rng: &mut RandomSource) -> Result<Tensor, BayesRustError> {
        let kind = self.distribution(id)?;
        let values = self.parent_values(id)?;
        let kernel = kind.build(&values)?;
        let shape = match self.vertices[id.0].shape() {
            Some(shape) => shape.to_vec(),
            None => {
                let shapes: Vec<&[usize]> = values.iter().map(|v| v.shape()).collect();
                kind.default_shape(&shapes)?
            }
        };
        let value = kernel.sample(&shape, rng)?;
        Ok(value.cast(kind.value_dtype()))
    }

    fn parent_values(&self, id: VertexId) -> Result<Vec<Tensor>, BayesRustError> {
        self.vertex(id)?.parents.iter().map(|&p| self.get_value(p)).collect()
    }

    // --- Observation ---

    /// Fixes a probabilistic vertex to `value` as observed data.
    pub fn observe(&mut self, id: VertexId, value: Tensor) -> Result<(), BayesRustError> {
        self.distribution(id)?;
        self.set_and_cascade(id, value)?;
        self.vertex_mut(id)?.observed = true;
        self.invalidate_duals(id);
        debug!("observed {}", id);
        Ok(())
    }

    /// Marks the current value as observed.
    pub fn observe_own_value(&mut self, id: VertexId) -> Result<(), BayesRustError> {
        self.distribution(id)?;
        self.value(id)?;
        self.vertex_mut(id)?.observed = true;
        self.invalidate_duals(id);
        debug!("observed own value of {}", id);
        Ok(())
    }

    pub fn unobserve(&mut self, id: VertexId) -> Result<(), BayesRustError> {
        self.distribution(id)?;
        self.vertex_mut(id)?.observed = false;
        self.invalidate_duals(id);
        Ok(())
    }

    // --- Densities ---

    /// The kernel of a probabilistic vertex given its parents' current values.
    pub fn kernel(&self, id: VertexId) -> Result<Kernel, BayesRustError> {
        let kind = self.distribution(id)?;
        kind.build(&self.parent_values(id)?)
    }

    /// Log density of the vertex's current value, summed over its elements.
    pub fn log_prob(&self, id: VertexId) -> Result<f64, BayesRustError> {
        let value = self.value(id)?;
        Ok(self.kernel(id)?.log_prob(value)?.sum_all())
    }

    /// Log density of `value` under the vertex's current distribution,
    /// without storing it.
    pub fn log_prob_of_value(&self, id: VertexId, value: &Tensor) -> Result<f64, BayesRustError> {
        Ok(self.kernel(id)?.log_prob(value)?.sum_all())
    }

    /// Replaces the sample points of a kernel-density vertex with `n` draws
    /// from itself.
    pub fn resample_kde(&mut self, id: VertexId, n: usize, rng: &mut RandomSource) -> Result<(), BayesRustError> {
        match &mut self.vertex_mut(id)?.kind {
            VertexKind::Probabilistic(DistributionKind::KernelDensity(kde)) => kde.resample(n, rng),
            _ => Err(BayesRustError::InvalidState(format!(
                "{} is not a kernel density vertex",
                id
            ))),
        }
    }

    // --- Structure ---

    /// Every vertex reachable from `id` following edges in either direction,
    /// in ascending order.
    pub fn connected_graph(&self, id: VertexId) -> Result<Vec<VertexId>, BayesRustError> {
        self.vertex(id)?;
        let mut seen = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(v) = stack.pop() {
            if seen.insert(v) {
                stack.extend_from_slice(&self.vertices[v.0].parents);
                stack.extend_from_slice(&self.children[v.0]);
            }
        }
        Ok(seen.into_iter().collect())
    }

    // --- Dual numbers ---

    /// Forward-mode dual number of `id`, memoised until a value upstream changes.
    pub fn dual_number(&mut self, id: VertexId) -> Result<DualNumber, BayesRustError> {
        if let Some(dual) = self.dual_cache.get(&id) {
            return Ok(dual.clone());
        }
        let mut memo = HashMap::new();
        let dual = Differentiator::calculate_dual_with(self, id, &mut memo)?;
        self.dual_cache.extend(memo);
        Ok(dual)
    }

    fn invalidate_duals(&mut self, id: VertexId) {
        if self.dual_cache.is_empty() {
            return;
        }
        let mut visited = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(v) = stack.pop() {
            if visited.insert(v) {
                self.dual_cache.remove(&v);
                stack.extend_from_slice(&self.children[v.0]);
            }
        }
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
