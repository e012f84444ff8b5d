use crate::tensor::Tensor;
use std::fmt;

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("dtype", &self.dtype())
            .field("data", &self.data())
            .finish()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank() == 0 {
            return write!(f, "{}", self.data()[0]);
        }
        write!(f, "{:?} {:?}", self.shape(), self.data())
    }
}

/// Tensors are equal when shape, dtype and every value match exactly.
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        if std::sync::Arc::ptr_eq(&self.data, &other.data) {
            return true;
        }
        self.shape() == other.shape() && self.dtype() == other.dtype() && self.data() == other.data()
    }
}
