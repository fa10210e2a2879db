//! Scalar container

use crate::dtype::{DType, Element};
use std::cell::Cell;

/// Single typed value
///
/// Scalars feed reduction results back to callers and carry semiring
/// identity elements into kernels.
#[derive(Debug, Default)]
pub struct Scalar<T: Element> {
    value: Cell<T>,
}

impl<T: Element> Scalar<T> {
    /// Create a scalar holding the type's zero
    pub fn new() -> Self {
        Self {
            value: Cell::new(T::zero()),
        }
    }

    /// Create a scalar holding `value`
    pub fn from_value(value: T) -> Self {
        Self {
            value: Cell::new(value),
        }
    }

    /// Element type of the container
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Current value
    #[inline]
    pub fn get_value(&self) -> T {
        self.value.get()
    }

    /// Replace the value
    #[inline]
    pub fn set_value(&self, value: T) {
        self.value.set(value);
    }
}
