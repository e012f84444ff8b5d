//! Shorthand constructors for common vertices.

use super::{DeterministicOp, DistributionKind, Graph, VertexId};
use crate::distributions::KernelDensity;
use crate::error::BayesRustError;
use crate::tensor::Tensor;
use crate::types::DType;

/// A distribution parameter given either as an existing vertex or as a
/// value that becomes a new constant vertex.
#[derive(Debug, Clone)]
pub enum ParamArg {
    Vertex(VertexId),
    Value(Tensor),
}

impl From<VertexId> for ParamArg {
    fn from(id: VertexId) -> Self {
        ParamArg::Vertex(id)
    }
}

impl From<f64> for ParamArg {
    fn from(value: f64) -> Self {
        ParamArg::Value(Tensor::scalar(value))
    }
}

impl From<i64> for ParamArg {
    fn from(value: i64) -> Self {
        ParamArg::Value(Tensor::scalar(value as f64).cast(DType::I64))
    }
}

impl From<Tensor> for ParamArg {
    fn from(value: Tensor) -> Self {
        ParamArg::Value(value)
    }
}

impl Graph {
    fn param(&mut self, arg: impl Into<ParamArg>) -> VertexId {
        match arg.into() {
            ParamArg::Vertex(id) => id,
            ParamArg::Value(value) => self.constant(value),
        }
    }

    pub fn gaussian(&mut self, mu: impl Into<ParamArg>, sigma: impl Into<ParamArg>) -> Result<VertexId, BayesRustError> {
        let mu = self.param(mu);
        let sigma = self.param(sigma);
        self.add_probabilistic(DistributionKind::Gaussian { mu, sigma }, None)
    }

    pub fn uniform(&mut self, min: impl Into<ParamArg>, max: impl Into<ParamArg>) -> Result<VertexId, BayesRustError> {
        let min = self.param(min);
        let max = self.param(max);
        self.add_probabilistic(DistributionKind::Uniform { min, max }, None)
    }

    pub fn exponential(
        &mut self,
        location: impl Into<ParamArg>,
        scale: impl Into<ParamArg>,
    ) -> Result<VertexId, BayesRustError> {
        let location = self.param(location);
        let scale = self.param(scale);
        self.add_probabilistic(DistributionKind::Exponential { location, scale }, None)
    }

    pub fn gamma(
        &mut self,
        location: impl Into<ParamArg>,
        scale: impl Into<ParamArg>,
        alpha: impl Into<ParamArg>,
    ) -> Result<VertexId, BayesRustError> {
        let location = self.param(location);
        let scale = self.param(scale);
        let alpha = self.param(alpha);
        self.add_probabilistic(DistributionKind::Gamma { location, scale, alpha }, None)
    }

    pub fn bernoulli(&mut self, p: impl Into<ParamArg>) -> Result<VertexId, BayesRustError> {
        let p = self.param(p);
        self.add_probabilistic(DistributionKind::Bernoulli { p }, None)
    }

    pub fn binomial(&mut self, p: impl Into<ParamArg>, n: impl Into<ParamArg>) -> Result<VertexId, BayesRustError> {
        let p = self.param(p);
        let n = self.param(n);
        self.add_probabilistic(DistributionKind::Binomial { p, n }, None)
    }

    /// `p` has the category axis first.
    pub fn categorical(&mut self, p: impl Into<ParamArg>) -> Result<VertexId, BayesRustError> {
        let p = self.param(p);
        self.add_probabilistic(DistributionKind::Categorical { p }, None)
    }

    pub fn multinomial(&mut self, n: impl Into<ParamArg>, p: impl Into<ParamArg>) -> Result<VertexId, BayesRustError> {
        let n = self.param(n);
        let p = self.param(p);
        self.add_probabilistic(DistributionKind::Multinomial { n, p }, None)
    }

    pub fn kernel_density(&mut self, kde: KernelDensity) -> Result<VertexId, BayesRustError> {
        self.add_probabilistic(DistributionKind::KernelDensity(kde), None)
    }

    pub fn add(&mut self, a: VertexId, b: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Add, &[a, b])
    }

    pub fn sub(&mut self, a: VertexId, b: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Sub, &[a, b])
    }

    pub fn mul(&mut self, a: VertexId, b: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Mul, &[a, b])
    }

    pub fn div(&mut self, a: VertexId, b: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Div, &[a, b])
    }

    pub fn pow(&mut self, base: VertexId, exponent: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Pow, &[base, exponent])
    }

    pub fn neg(&mut self, a: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Neg, &[a])
    }

    pub fn exp(&mut self, a: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Exp, &[a])
    }

    pub fn ln(&mut self, a: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Ln, &[a])
    }

    pub fn sum(&mut self, a: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Sum { axes: None }, &[a])
    }

    pub fn sum_axes(&mut self, a: VertexId, axes: &[usize]) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Sum { axes: Some(axes.to_vec()) }, &[a])
    }

    pub fn reshape(&mut self, a: VertexId, shape: Vec<usize>) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Reshape(shape), &[a])
    }

    pub fn concat(&mut self, parts: &[VertexId], axis: usize) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Concat { axis }, parts)
    }

    pub fn pluck(&mut self, a: VertexId, index: Vec<usize>) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Pluck(index), &[a])
    }

    pub fn if_then_else(
        &mut self,
        predicate: VertexId,
        on_true: VertexId,
        on_false: VertexId,
    ) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::If, &[predicate, on_true, on_false])
    }

    pub fn and(&mut self, a: VertexId, b: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::And, &[a, b])
    }

    pub fn or(&mut self, a: VertexId, b: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Or, &[a, b])
    }

    pub fn not(&mut self, a: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Not, &[a])
    }

    pub fn greater_than(&mut self, a: VertexId, b: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::GreaterThan, &[a, b])
    }

    pub fn less_than(&mut self, a: VertexId, b: VertexId) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::LessThan, &[a, b])
    }

    pub fn cast(&mut self, a: VertexId, dtype: DType) -> Result<VertexId, BayesRustError> {
        self.add_deterministic(DeterministicOp::Cast(dtype), &[a])
    }
}
