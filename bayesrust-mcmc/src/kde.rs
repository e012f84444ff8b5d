use crate::network_samples::{NetworkSamples, VertexSamples};
use bayesrust_core::distributions::KernelDensity;
use bayesrust_core::graph::VertexId;
use bayesrust_core::BayesRustError;

/// Builds a Gaussian kernel density estimate from the draws of one vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GaussianKde {
    /// Kernel width; Scott's rule when `None`.
    pub bandwidth: Option<f64>,
}

impl GaussianKde {
    pub fn new() -> Self {
        GaussianKde::default()
    }

    pub fn with_bandwidth(bandwidth: f64) -> Self {
        GaussianKde {
            bandwidth: Some(bandwidth),
        }
    }

    /// # Errors
    /// `ConstructionError` if a draw is not a scalar, there are no draws, or
    /// the bandwidth comes out non-positive (e.g. every draw is identical).
    pub fn approximate(&self, samples: &VertexSamples) -> Result<KernelDensity, BayesRustError> {
        let mut points = Vec::with_capacity(samples.len());
        for value in samples.as_slice() {
            if value.numel() != 1 {
                return Err(BayesRustError::ConstructionError {
                    distribution: "KernelDensity".to_string(),
                    reason: format!(
                        "samples of {} must be scalar, found shape {:?}",
                        samples.id(),
                        value.shape()
                    ),
                });
            }
            points.push(value.data()[0]);
        }
        if points.is_empty() {
            return Err(BayesRustError::ConstructionError {
                distribution: "KernelDensity".to_string(),
                reason: format!("no samples of {}", samples.id()),
            });
        }
        let bandwidth = self
            .bandwidth
            .unwrap_or_else(|| KernelDensity::scott_bandwidth(&points));
        KernelDensity::new(points, bandwidth)
    }

    pub fn approximate_vertex(&self, samples: &NetworkSamples, id: VertexId) -> Result<KernelDensity, BayesRustError> {
        self.approximate(&samples.get(id)?)
    }
}
