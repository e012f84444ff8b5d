/// Logical element type of a [`Tensor`](crate::tensor::Tensor).
///
/// Storage is always `f64`; the tag decides which operations are meaningful
/// and whether a vertex carrying the value can be differentiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DType {
    /// 64-bit floating-point values. The only differentiable type.
    #[default]
    F64,
    /// Whole numbers (counts, category indices).
    I64,
    /// Boolean values stored as 0.0 / 1.0.
    Bool,
}

impl DType {
    /// Returns true for the continuous type carried by differentiable vertices.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F64)
    }

    /// Coerces a raw value into the representable range of this type.
    pub(crate) fn coerce(&self, value: f64) -> f64 {
        match self {
            DType::F64 => value,
            DType::I64 => value.trunc(),
            DType::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}
