//! Input format signatures

use crate::block::{MatrixFormat, VectorFormat};
use smallvec::SmallVec;

/// Format an algorithm expects one input argument in
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotReq {
    /// A matrix argument in the given format
    Matrix(MatrixFormat),
    /// A vector argument in the given format
    Vector(VectorFormat),
}

/// Per-argument format requirements, ordered like [`super::Task::inputs`]
#[derive(Clone, Debug, Default)]
pub struct Signature {
    /// One requirement per input argument
    pub reqs: SmallVec<[SlotReq; 4]>,
}

impl Signature {
    /// Build a signature from requirements
    pub fn new(reqs: impl IntoIterator<Item = SlotReq>) -> Self {
        Self {
            reqs: reqs.into_iter().collect(),
        }
    }

    /// Signature of an operation without container inputs
    pub fn empty() -> Self {
        Self::default()
    }
}
