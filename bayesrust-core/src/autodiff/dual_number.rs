use crate::error::BayesRustError;
use crate::graph::VertexId;
use crate::tensor::utils::left_pad_shape;
use crate::tensor::{eye_for_shape, zeros, Tensor};
use crate::types::DType;
use std::collections::BTreeMap;

/// A value together with its partial derivatives.
#[derive(Debug, Clone)]
pub struct DualNumber {
    value: Tensor,
    partials: BTreeMap<VertexId, Tensor>,
}

impl DualNumber {
    pub fn new(value: Tensor, partials: BTreeMap<VertexId, Tensor>) -> Self {
        DualNumber { value, partials }
    }

    /// A value that depends on nothing.
    pub fn constant(value: Tensor) -> Self {
        DualNumber::new(value, BTreeMap::new())
    }

    /// The dual of a latent vertex: the identity partial with respect to itself.
    pub fn with_respect_to_self(id: VertexId, value: Tensor) -> Self {
        let mut partials = BTreeMap::new();
        partials.insert(id, eye_for_shape(value.shape()));
        DualNumber::new(value, partials)
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub fn partials(&self) -> &BTreeMap<VertexId, Tensor> {
        &self.partials
    }

    pub fn partial(&self, wrt: VertexId) -> Option<&Tensor> {
        self.partials.get(&wrt)
    }

    pub fn into_partials(self) -> BTreeMap<VertexId, Tensor> {
        self.partials
    }

    pub fn is_constant(&self) -> bool {
        self.partials.is_empty()
    }

    pub fn add(&self, other: &DualNumber) -> Result<DualNumber, BayesRustError> {
        let value = self.value.add(&other.value)?;
        let partials = merge(
            self.contribution(None, value.shape())?,
            other.contribution(None, value.shape())?,
        )?;
        Ok(DualNumber::new(value, partials))
    }

    pub fn sub(&self, other: &DualNumber) -> Result<DualNumber, BayesRustError> {
        let value = self.value.sub(&other.value)?;
        let partials = merge(
            self.contribution(None, value.shape())?,
            other.contribution(Some(&Tensor::scalar(-1.0)), value.shape())?,
        )?;
        Ok(DualNumber::new(value, partials))
    }

    pub fn mul(&self, other: &DualNumber) -> Result<DualNumber, BayesRustError> {
        let value = self.value.mul(&other.value)?;
        let partials = merge(
            self.contribution(Some(&other.value), value.shape())?,
            other.contribution(Some(&self.value), value.shape())?,
        )?;
        Ok(DualNumber::new(value, partials))
    }

    /// d(a/b) = da/b - a/b^2 db
    pub fn div(&self, other: &DualNumber) -> Result<DualNumber, BayesRustError> {
        let value = self.value.div(&other.value)?;
        let lhs = self.contribution(Some(&other.value.recip()), value.shape())?;
        let rhs = if other.is_constant() {
            BTreeMap::new()
        } else {
            let factor = self.value.div(&other.value.square())?.neg();
            other.contribution(Some(&factor), value.shape())?
        };
        Ok(DualNumber::new(value, merge(lhs, rhs)?))
    }

    /// d(a^b) = b a^(b-1) da + a^b ln(a) db
    pub fn pow(&self, exponent: &DualNumber) -> Result<DualNumber, BayesRustError> {
        let value = self.value.pow(&exponent.value)?;
        let lhs = if self.is_constant() {
            BTreeMap::new()
        } else {
            let factor = exponent.value.mul(&self.value.pow(&exponent.value.add_scalar(-1.0))?)?;
            self.contribution(Some(&factor), value.shape())?
        };
        let rhs = if exponent.is_constant() {
            BTreeMap::new()
        } else {
            let factor = value.mul(&self.value.ln())?;
            exponent.contribution(Some(&factor), value.shape())?
        };
        Ok(DualNumber::new(value, merge(lhs, rhs)?))
    }

    pub fn neg(&self) -> Result<DualNumber, BayesRustError> {
        let value = self.value.neg();
        let partials = self.contribution(Some(&Tensor::scalar(-1.0)), value.shape())?;
        Ok(DualNumber::new(value, partials))
    }

    pub fn exp(&self) -> Result<DualNumber, BayesRustError> {
        let value = self.value.exp();
        let partials = self.contribution(Some(&value), value.shape())?;
        Ok(DualNumber::new(value, partials))
    }

    pub fn ln(&self) -> Result<DualNumber, BayesRustError> {
        let value = self.value.ln();
        let partials = self.contribution(Some(&self.value.recip()), value.shape())?;
        Ok(DualNumber::new(value, partials))
    }

    /// Sums over `axes` of the value (all of them when `None`).
    pub fn sum(&self, axes: Option<&[usize]>) -> Result<DualNumber, BayesRustError> {
        let value = self.value.sum(axes, false)?;
        let of_axes: Vec<usize> = match axes {
            Some(axes) => axes.to_vec(),
            None => (0..self.value.rank()).collect(),
        };
        let partials = self
            .partials
            .iter()
            .map(|(&id, partial)| Ok((id, partial.sum(Some(&of_axes), false)?)))
            .collect::<Result<_, BayesRustError>>()?;
        Ok(DualNumber::new(value, partials))
    }

    pub fn reshape(&self, shape: Vec<usize>) -> Result<DualNumber, BayesRustError> {
        let value = self.value.reshape(shape.clone())?;
        let partials = self
            .partials
            .iter()
            .map(|(&id, partial)| {
                let mut target = shape.clone();
                target.extend_from_slice(self.wrt_shape(partial));
                Ok((id, partial.reshape(target)?))
            })
            .collect::<Result<_, BayesRustError>>()?;
        Ok(DualNumber::new(value, partials))
    }

    /// Joins duals along `axis`. A part with no partial for some vertex
    /// contributes zeros there.
    pub fn concat(parts: &[&DualNumber], axis: usize) -> Result<DualNumber, BayesRustError> {
        let values: Vec<&Tensor> = parts.iter().map(|d| &d.value).collect();
        let value = Tensor::concat(&values, axis)?;

        let mut wrt_shapes: BTreeMap<VertexId, Vec<usize>> = BTreeMap::new();
        for part in parts {
            for (&id, partial) in &part.partials {
                wrt_shapes.entry(id).or_insert_with(|| part.wrt_shape(partial).to_vec());
            }
        }

        let mut partials = BTreeMap::new();
        for (id, wrt_shape) in wrt_shapes {
            let pieces = parts
                .iter()
                .map(|part| match part.partials.get(&id) {
                    Some(partial) => partial.clone(),
                    None => {
                        let mut shape = part.value.shape().to_vec();
                        shape.extend_from_slice(&wrt_shape);
                        zeros(&shape)
                    }
                })
                .collect::<Vec<_>>();
            let refs: Vec<&Tensor> = pieces.iter().collect();
            partials.insert(id, Tensor::concat(&refs, axis)?);
        }
        Ok(DualNumber::new(value, partials))
    }

    /// The single element at `index`, as a scalar.
    pub fn pluck(&self, index: &[usize]) -> Result<DualNumber, BayesRustError> {
        let flat = crate::tensor::utils::ravel_index(index, self.value.shape())?;
        let value = Tensor::new_with_dtype(vec![self.value.get(index)?], vec![], self.value.dtype())?;
        let numel = self.value.numel();
        let partials = self
            .partials
            .iter()
            .map(|(&id, partial)| {
                let wrt_shape = self.wrt_shape(partial).to_vec();
                let rows = partial.reshape(vec![numel, partial.numel() / numel.max(1)])?;
                Ok((id, rows.select(0, flat)?.reshape(wrt_shape)?))
            })
            .collect::<Result<_, BayesRustError>>()?;
        Ok(DualNumber::new(value, partials))
    }

    /// Elementwise selection between two duals by a boolean mask.
    pub fn if_then_else(mask: &Tensor, on_true: &DualNumber, on_false: &DualNumber) -> Result<DualNumber, BayesRustError> {
        let value = Tensor::where_mask(mask, &on_true.value, &on_false.value)?;
        let take_true = mask.cast(DType::F64);
        let take_false = take_true.rsub_scalar(1.0);
        let partials = merge(
            on_true.contribution(Some(&take_true), value.shape())?,
            on_false.contribution(Some(&take_false), value.shape())?,
        )?;
        Ok(DualNumber::new(value, partials))
    }

    fn wrt_shape<'a>(&self, partial: &'a Tensor) -> &'a [usize] {
        &partial.shape()[self.value.rank()..]
    }

    /// Partials expanded to an output of shape `out_shape`, each scaled
    /// elementwise by `factor` (broadcast over the output).
    fn contribution(
        &self,
        factor: Option<&Tensor>,
        out_shape: &[usize],
    ) -> Result<BTreeMap<VertexId, Tensor>, BayesRustError> {
        let factor = factor.map(|f| f.broadcast_to(out_shape)).transpose()?;
        let mut out = BTreeMap::new();
        for (&id, partial) in &self.partials {
            let wrt_shape = self.wrt_shape(partial);

            let mut padded = left_pad_shape(self.value.shape(), out_shape.len());
            padded.extend_from_slice(wrt_shape);
            let mut expanded_shape = out_shape.to_vec();
            expanded_shape.extend_from_slice(wrt_shape);
            let expanded = partial.reshape(padded)?.broadcast_to(&expanded_shape)?;

            let scaled = match &factor {
                Some(factor) => {
                    let mut factor_shape = out_shape.to_vec();
                    factor_shape.resize(out_shape.len() + wrt_shape.len(), 1);
                    expanded.mul(&factor.reshape(factor_shape)?)?
                }
                None => expanded,
            };
            out.insert(id, scaled);
        }
        Ok(out)
    }
}

/// Union of two partial maps, summing entries present in both.
fn merge(
    mut lhs: BTreeMap<VertexId, Tensor>,
    rhs: BTreeMap<VertexId, Tensor>,
) -> Result<BTreeMap<VertexId, Tensor>, BayesRustError> {
    for (id, partial) in rhs {
        let combined = match lhs.remove(&id) {
            Some(existing) => existing.add(&partial)?,
            None => partial,
        };
        lhs.insert(id, combined);
    }
    Ok(lhs)
}

#[cfg(test)]
#[path = "dual_number_test.rs"]
mod tests;
