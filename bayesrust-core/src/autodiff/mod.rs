//! Forward-mode automatic differentiation over the model graph.
//!
//! Every real-valued vertex is mapped to a [`DualNumber`]: its value plus the
//! partial derivatives of that value with respect to the latent vertices
//! upstream of it. A partial with respect to vertex `v` has shape
//! `value.shape() ++ v.shape()`.

mod differentiator;
mod dual_number;
mod log_prob_gradient;

pub use differentiator::Differentiator;
pub use dual_number::DualNumber;
