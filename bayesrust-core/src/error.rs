use crate::graph::VertexId;
use crate::types::DType;
use thiserror::Error;

/// Custom error type for the BayesRust framework.
///
/// Out-of-support values are *not* errors: `log_prob` reports them as `-∞`.
/// Errors are raised where the invalid input is supplied (construction or a
/// public call), never lazily deep inside a traversal.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum BayesRustError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Cannot broadcast shapes: {shape1:?} and {shape2:?}")]
    BroadcastError {
        shape1: Vec<usize>,
        shape2: Vec<usize>,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Index out of bounds: index {index:?} for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Invalid axis {axis} for tensor of rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    #[error("Data type mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DTypeMismatch {
        expected: DType,
        actual: DType,
        operation: String,
    },

    /// A distribution or vertex was built with a parameter outside its domain.
    #[error("Invalid parameters for {distribution}: {reason}")]
    ConstructionError { distribution: String, reason: String },

    /// A density was requested for a value that breaks a hard validity rule
    /// (e.g. multinomial counts that do not sum to the trial count).
    #[error("Invalid value for {distribution}: {reason}")]
    InvalidValue { distribution: String, reason: String },

    #[error("Operation '{operation}' on vertex {vertex:?} has no defined derivative")]
    UnsupportedDifferentiation { vertex: VertexId, operation: String },

    #[error("No state with non-zero probability found after {attempts} attempts")]
    NoFeasibleState { attempts: usize },

    #[error("Numeric error in {operation}: {reason}")]
    NumericError { operation: String, reason: String },

    #[error("Vertex {0:?} has no value set")]
    ValueNotSet(VertexId),

    #[error("Vertex {0:?} does not exist in this graph")]
    VertexNotFound(VertexId),

    #[error("Vertex {0:?} is not probabilistic")]
    NotProbabilistic(VertexId),

    #[error("Vertex {0:?} was not sampled in this trace")]
    VertexNotInTrace(VertexId),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Cycle detected in the vertex graph")]
    CycleDetected,

    #[error("Internal error: {0}")]
    InternalError(String),
}
