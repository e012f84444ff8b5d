//! Deterministic operators and their forward evaluation.

use crate::error::BayesRustError;
use crate::tensor::utils::{broadcast_all_shapes, broadcast_shapes};
use crate::tensor::Tensor;
use crate::types::DType;

/// Operator of a deterministic vertex. Operands are the vertex's parents, in order.
#[derive(Debug, Clone)]
pub enum DeterministicOp {
    /// Fixed value, no parents.
    Constant(Tensor),
    Add,
    Sub,
    Mul,
    Div,
    /// `base ^ exponent`
    Pow,
    Neg,
    Exp,
    Ln,
    /// Sum over the given axes, or over everything when `None`.
    Sum { axes: Option<Vec<usize>> },
    Reshape(Vec<usize>),
    /// Joins every parent along `axis`.
    Concat { axis: usize },
    /// Single element at a multi-index, as a scalar.
    Pluck(Vec<usize>),
    /// Elementwise `predicate ? on_true : on_false`.
    If,
    And,
    Or,
    Not,
    GreaterThan,
    LessThan,
    Cast(DType),
}

impl DeterministicOp {
    pub fn name(&self) -> &'static str {
        match self {
            DeterministicOp::Constant(_) => "Constant",
            DeterministicOp::Add => "Add",
            DeterministicOp::Sub => "Sub",
            DeterministicOp::Mul => "Mul",
            DeterministicOp::Div => "Div",
            DeterministicOp::Pow => "Pow",
            DeterministicOp::Neg => "Neg",
            DeterministicOp::Exp => "Exp",
            DeterministicOp::Ln => "Ln",
            DeterministicOp::Sum { .. } => "Sum",
            DeterministicOp::Reshape(_) => "Reshape",
            DeterministicOp::Concat { .. } => "Concat",
            DeterministicOp::Pluck(_) => "Pluck",
            DeterministicOp::If => "If",
            DeterministicOp::And => "And",
            DeterministicOp::Or => "Or",
            DeterministicOp::Not => "Not",
            DeterministicOp::GreaterThan => "GreaterThan",
            DeterministicOp::LessThan => "LessThan",
            DeterministicOp::Cast(_) => "Cast",
        }
    }

    /// Number of operands, `None` for variadic operators.
    fn arity(&self) -> Option<usize> {
        match self {
            DeterministicOp::Constant(_) => Some(0),
            DeterministicOp::Neg
            | DeterministicOp::Exp
            | DeterministicOp::Ln
            | DeterministicOp::Sum { .. }
            | DeterministicOp::Reshape(_)
            | DeterministicOp::Pluck(_)
            | DeterministicOp::Not
            | DeterministicOp::Cast(_) => Some(1),
            DeterministicOp::If => Some(3),
            DeterministicOp::Concat { .. } => None,
            _ => Some(2),
        }
    }

    /// Whether forward-mode derivatives propagate through this operator.
    pub fn is_differentiable(&self) -> bool {
        !matches!(
            self,
            DeterministicOp::And
                | DeterministicOp::Or
                | DeterministicOp::Not
                | DeterministicOp::GreaterThan
                | DeterministicOp::LessThan
                | DeterministicOp::Cast(_)
        )
    }

    pub(crate) fn check_arity(&self, operands: usize) -> Result<(), BayesRustError> {
        let ok = match self.arity() {
            Some(n) => n == operands,
            None => operands > 0,
        };
        if ok {
            Ok(())
        } else {
            Err(BayesRustError::InvalidState(format!(
                "{} does not accept {} operand(s)",
                self.name(),
                operands
            )))
        }
    }

    /// Output dtype given operand dtypes.
    pub(crate) fn output_dtype(&self, dtypes: &[DType]) -> DType {
        match self {
            DeterministicOp::Constant(t) => t.dtype(),
            DeterministicOp::And
            | DeterministicOp::Or
            | DeterministicOp::Not
            | DeterministicOp::GreaterThan
            | DeterministicOp::LessThan => DType::Bool,
            DeterministicOp::Cast(dtype) => *dtype,
            DeterministicOp::Reshape(_) | DeterministicOp::Pluck(_) => dtypes[0],
            DeterministicOp::Concat { .. } => {
                if dtypes.iter().all(|d| *d == dtypes[0]) {
                    dtypes[0]
                } else {
                    DType::F64
                }
            }
            DeterministicOp::If => {
                if dtypes[1] == dtypes[2] {
                    dtypes[1]
                } else {
                    DType::F64
                }
            }
            _ => DType::F64,
        }
    }

    /// Output shape given operand shapes; `None` while any operand shape is unresolved.
    pub(crate) fn output_shape(&self, shapes: &[Option<&[usize]>]) -> Result<Option<Vec<usize>>, BayesRustError> {
        let Some(shapes) = shapes.iter().copied().collect::<Option<Vec<&[usize]>>>() else {
            return Ok(None);
        };
        let shape = match self {
            DeterministicOp::Constant(t) => t.shape().to_vec(),
            DeterministicOp::Neg
            | DeterministicOp::Exp
            | DeterministicOp::Ln
            | DeterministicOp::Not
            | DeterministicOp::Cast(_) => shapes[0].to_vec(),
            DeterministicOp::Sum { axes: None } => vec![],
            DeterministicOp::Sum { axes: Some(axes) } => {
                let rank = shapes[0].len();
                if let Some(&axis) = axes.iter().find(|&&a| a >= rank) {
                    return Err(BayesRustError::InvalidAxis { axis, rank });
                }
                shapes[0]
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !axes.contains(i))
                    .map(|(_, &d)| d)
                    .collect()
            }
            DeterministicOp::Reshape(target) => {
                let numel: usize = shapes[0].iter().product();
                if numel != target.iter().product::<usize>() {
                    return Err(BayesRustError::ShapeMismatch {
                        expected: target.clone(),
                        actual: shapes[0].to_vec(),
                        operation: "Reshape".to_string(),
                    });
                }
                target.clone()
            }
            DeterministicOp::Concat { axis } => {
                let first = shapes[0];
                if *axis >= first.len() {
                    return Err(BayesRustError::InvalidAxis {
                        axis: *axis,
                        rank: first.len(),
                    });
                }
                let mut out = first.to_vec();
                for s in &shapes[1..] {
                    let compatible = s.len() == first.len()
                        && s.iter().zip(first).enumerate().all(|(i, (a, b))| i == *axis || a == b);
                    if !compatible {
                        return Err(BayesRustError::ShapeMismatch {
                            expected: first.to_vec(),
                            actual: s.to_vec(),
                            operation: format!("Concat along axis {}", axis),
                        });
                    }
                    out[*axis] += s[*axis];
                }
                out
            }
            DeterministicOp::Pluck(index) => {
                crate::tensor::utils::ravel_index(index, shapes[0])?;
                vec![]
            }
            DeterministicOp::If => broadcast_all_shapes(&shapes)?,
            _ => broadcast_shapes(shapes[0], shapes[1])?,
        };
        Ok(Some(shape))
    }

    /// Evaluates the operator on concrete operand values.
    pub fn compute(&self, inputs: &[&Tensor]) -> Result<Tensor, BayesRustError> {
        self.check_arity(inputs.len())?;
        match self {
            DeterministicOp::Constant(t) => Ok(t.clone()),
            DeterministicOp::Add => inputs[0].add(inputs[1]),
            DeterministicOp::Sub => inputs[0].sub(inputs[1]),
            DeterministicOp::Mul => inputs[0].mul(inputs[1]),
            DeterministicOp::Div => inputs[0].div(inputs[1]),
            DeterministicOp::Pow => inputs[0].pow(inputs[1]),
            DeterministicOp::Neg => Ok(inputs[0].neg()),
            DeterministicOp::Exp => Ok(inputs[0].exp()),
            DeterministicOp::Ln => Ok(inputs[0].ln()),
            DeterministicOp::Sum { axes } => inputs[0].sum(axes.as_deref(), false),
            DeterministicOp::Reshape(shape) => inputs[0].reshape(shape.clone()),
            DeterministicOp::Concat { axis } => Tensor::concat(inputs, *axis),
            DeterministicOp::Pluck(index) => {
                let value = inputs[0].get(index)?;
                Tensor::new_with_dtype(vec![value], vec![], inputs[0].dtype())
            }
            DeterministicOp::If => Tensor::where_mask(inputs[0], inputs[1], inputs[2]),
            DeterministicOp::And => inputs[0].logical_and(inputs[1]),
            DeterministicOp::Or => inputs[0].logical_or(inputs[1]),
            DeterministicOp::Not => Ok(inputs[0].logical_not()),
            DeterministicOp::GreaterThan => inputs[0].gt(inputs[1]),
            DeterministicOp::LessThan => inputs[0].lt(inputs[1]),
            DeterministicOp::Cast(dtype) => Ok(inputs[0].cast(*dtype)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::from_bools;

    #[test]
    fn test_output_shapes() {
        let a: &[usize] = &[2, 3];
        let b: &[usize] = &[3];
        assert_eq!(DeterministicOp::Mul.output_shape(&[Some(a), Some(b)]).unwrap(), Some(vec![2, 3]));
        assert_eq!(
            DeterministicOp::Sum { axes: Some(vec![1]) }.output_shape(&[Some(a)]).unwrap(),
            Some(vec![2])
        );
        assert_eq!(DeterministicOp::Sum { axes: None }.output_shape(&[Some(a)]).unwrap(), Some(vec![]));
        assert_eq!(
            DeterministicOp::Concat { axis: 0 }.output_shape(&[Some(a), Some(a)]).unwrap(),
            Some(vec![4, 3])
        );
        assert_eq!(DeterministicOp::Add.output_shape(&[None, Some(b)]).unwrap(), None);
        assert!(DeterministicOp::Reshape(vec![5]).output_shape(&[Some(a)]).is_err());
        assert!(DeterministicOp::Pluck(vec![2, 0]).output_shape(&[Some(a)]).is_err());
    }

    #[test]
    fn test_output_dtypes() {
        assert_eq!(DeterministicOp::Add.output_dtype(&[DType::I64, DType::I64]), DType::F64);
        assert_eq!(DeterministicOp::And.output_dtype(&[DType::Bool, DType::Bool]), DType::Bool);
        assert_eq!(
            DeterministicOp::If.output_dtype(&[DType::Bool, DType::F64, DType::F64]),
            DType::F64
        );
        assert_eq!(DeterministicOp::Cast(DType::I64).output_dtype(&[DType::F64]), DType::I64);
    }

    #[test]
    fn test_compute_if() {
        let mask = from_bools(&[true, false], vec![2]).unwrap();
        let out = DeterministicOp::If
            .compute(&[&mask, &Tensor::scalar(0.9), &Tensor::scalar(0.1)])
            .unwrap();
        assert_eq!(out.data(), &[0.9, 0.1]);
    }

    #[test]
    fn test_compute_pluck_and_arity() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let p = DeterministicOp::Pluck(vec![1, 0]).compute(&[&t]).unwrap();
        assert_eq!(p.shape(), &[] as &[usize]);
        assert_eq!(p.scalar_value().unwrap(), 3.0);
        assert!(DeterministicOp::Add.compute(&[&t]).is_err());
    }

    #[test]
    fn test_differentiability() {
        assert!(DeterministicOp::Mul.is_differentiable());
        assert!(DeterministicOp::If.is_differentiable());
        assert!(!DeterministicOp::Cast(DType::F64).is_differentiable());
    }
}
