use super::{Distribution, Param};
use crate::error::BayesRustError;
use crate::tensor::Tensor;
use thiserror::Error;

/// Error type for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for {param:?}, element {element_index}: analytical {analytical} != numerical {numerical} (difference {difference})")]
    GradientMismatch {
        param: Param,
        element_index: usize,
        analytical: f64,
        numerical: f64,
        difference: f64,
    },
    #[error("No analytical derivative returned for {0:?}")]
    MissingAnalyticalGrad(Param),
    #[error("Numerical derivative is not finite for {param:?}, element {element_index}: log_prob+ {log_prob_plus}, log_prob- {log_prob_minus}")]
    NumericalGradNonFinite {
        param: Param,
        element_index: usize,
        log_prob_plus: f64,
        log_prob_minus: f64,
    },
    #[error("Tensor error during gradient check: {0}")]
    TensorError(BayesRustError),
}

impl From<BayesRustError> for GradCheckError {
    fn from(err: BayesRustError) -> Self {
        GradCheckError::TensorError(err)
    }
}

fn perturb(tensor: &Tensor, element_index: usize, delta: f64) -> Result<Tensor, BayesRustError> {
    let mut data = tensor.to_vec();
    data[element_index] += delta;
    Tensor::new_with_dtype(data, tensor.shape().to_vec(), tensor.dtype())
}

fn compare(
    param: Param,
    element_index: usize,
    analytical: f64,
    log_prob_plus: f64,
    log_prob_minus: f64,
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError> {
    let numerical = (log_prob_plus - log_prob_minus) / (2.0 * epsilon);
    if !numerical.is_finite() {
        return Err(GradCheckError::NumericalGradNonFinite {
            param,
            element_index,
            log_prob_plus,
            log_prob_minus,
        });
    }
    let difference = (analytical - numerical).abs();
    let scale = 1.0_f64.max(analytical.abs()).max(numerical.abs());
    if difference > tolerance * scale {
        return Err(GradCheckError::GradientMismatch {
            param,
            element_index,
            analytical,
            numerical,
            difference,
        });
    }
    Ok(())
}

/// Compares `d_log_prob` against centred finite differences of the summed
/// log density, for every parameter element and, when the kernel reports
/// one, every element of `x`.
///
/// `build` constructs the kernel from parameter values given in the order of
/// `params`.
pub fn check_log_prob_gradient<D, F>(
    build: F,
    params: &[(Param, Tensor)],
    x: &Tensor,
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    D: Distribution,
    F: Fn(&[Tensor]) -> Result<D, BayesRustError>,
{
    let values: Vec<Tensor> = params.iter().map(|(_, t)| t.clone()).collect();
    let kernel = build(&values)?;
    let diffs = kernel.d_log_prob(x)?;

    for (i, (param, tensor)) in params.iter().enumerate() {
        let analytical = diffs
            .get(*param)
            .ok_or(GradCheckError::MissingAnalyticalGrad(*param))?
            .sum_to_shape(tensor.shape())?;
        for element_index in 0..tensor.numel() {
            let mut shifted = values.clone();
            shifted[i] = perturb(tensor, element_index, epsilon)?;
            let plus = build(&shifted)?.log_prob(x)?.sum_all();
            shifted[i] = perturb(tensor, element_index, -epsilon)?;
            let minus = build(&shifted)?.log_prob(x)?.sum_all();
            compare(
                *param,
                element_index,
                analytical.data()[element_index],
                plus,
                minus,
                epsilon,
                tolerance,
            )?;
        }
    }

    if let Some(d_x) = diffs.get(Param::X) {
        let analytical = d_x.sum_to_shape(x.shape())?;
        for element_index in 0..x.numel() {
            let plus = kernel.log_prob(&perturb(x, element_index, epsilon)?)?.sum_all();
            let minus = kernel.log_prob(&perturb(x, element_index, -epsilon)?)?.sum_all();
            compare(
                Param::X,
                element_index,
                analytical.data()[element_index],
                plus,
                minus,
                epsilon,
                tolerance,
            )?;
        }
    }
    Ok(())
}
