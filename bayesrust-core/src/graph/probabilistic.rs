//! Distribution families a probabilistic vertex can follow.

use super::VertexId;
use crate::distributions::{
    Bernoulli, Binomial, Categorical, Exponential, Gamma, Gaussian, Kernel, KernelDensity, Multinomial, Param, Uniform,
};
use crate::error::BayesRustError;
use crate::tensor::utils::{broadcast_all_shapes, broadcast_shapes};
use crate::tensor::Tensor;
use crate::types::DType;

/// Family of a probabilistic vertex, with the parent vertex feeding each parameter.
#[derive(Debug, Clone)]
pub enum DistributionKind {
    Gaussian { mu: VertexId, sigma: VertexId },
    Uniform { min: VertexId, max: VertexId },
    Exponential { location: VertexId, scale: VertexId },
    Gamma { location: VertexId, scale: VertexId, alpha: VertexId },
    Bernoulli { p: VertexId },
    Binomial { p: VertexId, n: VertexId },
    /// `p` is laid out `[category, batch...]`.
    Categorical { p: VertexId },
    /// `p` is laid out `[category, batch...]`.
    Multinomial { n: VertexId, p: VertexId },
    /// Parameter-free; holds its own sample points.
    KernelDensity(KernelDensity),
}

impl DistributionKind {
    pub fn name(&self) -> &'static str {
        match self {
            DistributionKind::Gaussian { .. } => "Gaussian",
            DistributionKind::Uniform { .. } => "Uniform",
            DistributionKind::Exponential { .. } => "Exponential",
            DistributionKind::Gamma { .. } => "Gamma",
            DistributionKind::Bernoulli { .. } => "Bernoulli",
            DistributionKind::Binomial { .. } => "Binomial",
            DistributionKind::Categorical { .. } => "Categorical",
            DistributionKind::Multinomial { .. } => "Multinomial",
            DistributionKind::KernelDensity(_) => "KernelDensity",
        }
    }

    /// Parameter roles and the parents that feed them, in parent order.
    pub fn params(&self) -> Vec<(Param, VertexId)> {
        match *self {
            DistributionKind::Gaussian { mu, sigma } => vec![(Param::Mu, mu), (Param::Sigma, sigma)],
            DistributionKind::Uniform { min, max } => vec![(Param::Min, min), (Param::Max, max)],
            DistributionKind::Exponential { location, scale } => {
                vec![(Param::Location, location), (Param::Scale, scale)]
            }
            DistributionKind::Gamma { location, scale, alpha } => vec![
                (Param::Location, location),
                (Param::Scale, scale),
                (Param::Alpha, alpha),
            ],
            DistributionKind::Bernoulli { p } | DistributionKind::Categorical { p } => vec![(Param::P, p)],
            DistributionKind::Binomial { p, n } => vec![(Param::P, p), (Param::N, n)],
            DistributionKind::Multinomial { n, p } => vec![(Param::N, n), (Param::P, p)],
            DistributionKind::KernelDensity(_) => vec![],
        }
    }

    pub fn parents(&self) -> Vec<VertexId> {
        self.params().into_iter().map(|(_, id)| id).collect()
    }

    /// Dtype of the values this family produces.
    pub fn value_dtype(&self) -> DType {
        match self {
            DistributionKind::Bernoulli { .. } => DType::Bool,
            DistributionKind::Binomial { .. }
            | DistributionKind::Categorical { .. }
            | DistributionKind::Multinomial { .. } => DType::I64,
            _ => DType::F64,
        }
    }

    /// Shape of one draw implied by the parameter shapes.
    pub(crate) fn default_shape(&self, shapes: &[&[usize]]) -> Result<Vec<usize>, BayesRustError> {
        match self {
            DistributionKind::Categorical { .. } => Ok(shapes[0].get(1..).unwrap_or(&[]).to_vec()),
            DistributionKind::Multinomial { .. } => {
                let (k, batch) = match shapes[1].split_first() {
                    Some((&k, batch)) => (k, batch),
                    None => (1, &[][..]),
                };
                let mut shape = vec![k];
                shape.extend(broadcast_shapes(shapes[0], batch)?);
                Ok(shape)
            }
            DistributionKind::KernelDensity(_) => Ok(vec![]),
            _ => broadcast_all_shapes(shapes),
        }
    }

    /// Checks that an explicitly requested vertex shape can hold draws given
    /// the parameter shapes.
    pub(crate) fn accepts_shape(&self, shape: &[usize], shapes: &[&[usize]]) -> Result<(), BayesRustError> {
        let implied = self.default_shape(shapes)?;
        let ok = match self {
            DistributionKind::KernelDensity(_) => true,
            DistributionKind::Multinomial { .. } => {
                !shape.is_empty()
                    && shape[0] == implied[0]
                    && broadcast_shapes(&implied[1..], &shape[1..]).map_or(false, |s| s.as_slice() == &shape[1..])
            }
            _ => broadcast_shapes(&implied, shape).map_or(false, |s| s == shape),
        };
        if ok {
            Ok(())
        } else {
            Err(BayesRustError::ShapeMismatch {
                expected: implied,
                actual: shape.to_vec(),
                operation: format!("{} vertex shape", self.name()),
            })
        }
    }

    /// Builds the kernel from parameter values given in `params()` order.
    pub fn build(&self, values: &[Tensor]) -> Result<Kernel, BayesRustError> {
        let v = |i: usize| values[i].clone();
        Ok(match self {
            DistributionKind::Gaussian { .. } => Kernel::Gaussian(Gaussian::new(v(0), v(1))?),
            DistributionKind::Uniform { .. } => Kernel::Uniform(Uniform::new(v(0), v(1))?),
            DistributionKind::Exponential { .. } => Kernel::Exponential(Exponential::new(v(0), v(1))?),
            DistributionKind::Gamma { .. } => Kernel::Gamma(Gamma::new(v(0), v(1), v(2))?),
            DistributionKind::Bernoulli { .. } => Kernel::Bernoulli(Bernoulli::new(v(0))?),
            DistributionKind::Binomial { .. } => Kernel::Binomial(Binomial::new(v(0), v(1))?),
            DistributionKind::Categorical { .. } => Kernel::Categorical(Categorical::new(v(0))?),
            DistributionKind::Multinomial { .. } => Kernel::Multinomial(Multinomial::new(v(0), v(1))?),
            DistributionKind::KernelDensity(kde) => Kernel::KernelDensity(kde.clone()),
        })
    }
}
