//! Probabilistic models as graphs of tensor-valued vertices, with
//! forward-mode differentiation and the distribution kernels they draw from.

pub mod autodiff;
pub mod distributions;
pub mod graph;
pub mod network;
pub mod random;
pub mod tensor;
pub mod tensor_data;
pub mod types;

pub mod error;
pub use error::BayesRustError;

pub use autodiff::{DualNumber, Differentiator};
pub use graph::{Graph, VertexId};
pub use network::BayesianNetwork;
pub use random::RandomSource;
pub use tensor::Tensor;
pub use types::DType;
