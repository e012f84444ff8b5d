use super::operators::DeterministicOp;
use super::probabilistic::DistributionKind;
use crate::tensor::Tensor;
use crate::types::DType;
use std::fmt;

/// Dense index of a vertex within its `Graph`. Parents always have smaller
/// ids than their children, so ascending id order is a topological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

impl VertexId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Whether a vertex computes its value from its parents or is drawn from a
/// distribution parameterised by them.
#[derive(Debug, Clone)]
pub enum VertexKind {
    Deterministic(DeterministicOp),
    Probabilistic(DistributionKind),
}

/// A node of the model graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub(crate) id: VertexId,
    pub(crate) kind: VertexKind,
    pub(crate) parents: Vec<VertexId>,
    /// `None` until the shape is known (set by the first assigned value).
    pub(crate) shape: Option<Vec<usize>>,
    pub(crate) dtype: DType,
    pub(crate) value: Option<Tensor>,
    pub(crate) observed: bool,
    pub(crate) label: Option<String>,
}

impl Vertex {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn kind(&self) -> &VertexKind {
        &self.kind
    }

    pub fn parents(&self) -> &[VertexId] {
        &self.parents
    }

    pub fn shape(&self) -> Option<&[usize]> {
        self.shape.as_deref()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_probabilistic(&self) -> bool {
        matches!(self.kind, VertexKind::Probabilistic(_))
    }

    pub fn is_deterministic(&self) -> bool {
        !self.is_probabilistic()
    }

    /// Only real-valued vertices carry derivatives.
    pub fn is_differentiable(&self) -> bool {
        self.dtype.is_float()
    }
}
