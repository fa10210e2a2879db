//! Dispatchable operation descriptions

use crate::container::{Matrix, Scalar, Vector};
use crate::descriptor::Descriptor;
use crate::dtype::Element;
use crate::op::{OpBinaryRef, OpSelectRef, OpUnaryRef};
use smallvec::SmallVec;

/// One operation over containers, ready for dispatch
///
/// A task names its output (`r`), its inputs, the operators
/// parameterising the semiring, and the descriptor. Tasks borrow their
/// containers; the dispatcher and the chosen algorithm run to completion
/// within that borrow.
pub enum Task<'a, T: Element> {
    /// Masked vector-matrix product over `(op_multiply, op_add)`
    VxmMasked {
        /// Output vector of length `m.n_cols()`
        r: &'a Vector<T>,
        /// Mask restricting writable indices via `op_select`
        mask: &'a Vector<T>,
        /// Input vector of length `m.n_rows()`
        v: &'a Vector<T>,
        /// Input matrix
        m: &'a Matrix<T>,
        /// Combine operator applied to `(v[i], m[i,j])`
        op_multiply: OpBinaryRef<T>,
        /// Reduce operator accumulating into `r[j]`
        op_add: OpBinaryRef<T>,
        /// Predicate over mask values
        op_select: OpSelectRef<T>,
        /// Initial value of every output cell
        init: T,
        /// Operation hints
        desc: Descriptor,
    },

    /// Element-wise combine over the union of stored indices
    VEwiseAddMasked {
        /// Output vector
        r: &'a Vector<T>,
        /// Optional mask; absent means every index is writable
        mask: Option<&'a Vector<T>>,
        /// Left input
        a: &'a Vector<T>,
        /// Right input
        b: &'a Vector<T>,
        /// Combine operator for indices present on both sides
        op: OpBinaryRef<T>,
        /// Predicate over mask values
        op_select: OpSelectRef<T>,
    },

    /// Element-wise combine over the intersection of stored indices
    VEwiseMultMasked {
        /// Output vector
        r: &'a Vector<T>,
        /// Optional mask; absent means every index is writable
        mask: Option<&'a Vector<T>>,
        /// Left input
        a: &'a Vector<T>,
        /// Right input
        b: &'a Vector<T>,
        /// Combine operator
        op: OpBinaryRef<T>,
        /// Predicate over mask values
        op_select: OpSelectRef<T>,
    },

    /// Masked scalar assignment `r[i] ← op_assign(r[i], value)`
    VAssignMasked {
        /// Output vector, updated in place
        r: &'a Vector<T>,
        /// Mask choosing the assigned indices
        mask: &'a Vector<T>,
        /// Assigned scalar
        value: T,
        /// Combine operator between old cell and scalar
        op_assign: OpBinaryRef<T>,
        /// Predicate over mask values
        op_select: OpSelectRef<T>,
    },

    /// Fold of all stored entries into a scalar
    VReduce {
        /// Output scalar
        r: &'a Scalar<T>,
        /// Fold seed
        init: T,
        /// Input vector
        v: &'a Vector<T>,
        /// Fold operator, must be associative
        op_reduce: OpBinaryRef<T>,
    },

    /// Element-wise unary map
    VMap {
        /// Output vector
        r: &'a Vector<T>,
        /// Input vector
        v: &'a Vector<T>,
        /// Applied operator
        op: OpUnaryRef<T>,
    },

    /// Bulk build of a matrix from coordinate triplets
    MBuild {
        /// Output matrix
        r: &'a Matrix<T>,
        /// Row keys
        rows: &'a [u32],
        /// Column keys
        cols: &'a [u32],
        /// Values
        values: &'a [T],
    },

    /// Matrix transposition
    MTranspose {
        /// Output matrix of shape `(m.n_cols(), m.n_rows())`
        r: &'a Matrix<T>,
        /// Input matrix
        m: &'a Matrix<T>,
    },

    /// Scalar combine `r = op_reduce(a, b)`
    ScalarReduce {
        /// Output scalar
        r: &'a Scalar<T>,
        /// Left input
        a: &'a Scalar<T>,
        /// Right input
        b: &'a Scalar<T>,
        /// Combine operator
        op_reduce: OpBinaryRef<T>,
    },
}

/// Borrowed reference to one input container of a task
pub enum ArgRef<'a, T: Element> {
    /// A matrix argument
    Matrix(&'a Matrix<T>),
    /// A vector argument
    Vector(&'a Vector<T>),
}

impl<'a, T: Element> Task<'a, T> {
    /// Registered operation name of this task
    pub fn name(&self) -> &'static str {
        match self {
            Self::VxmMasked { .. } => "vxm_masked",
            Self::VEwiseAddMasked { .. } => "v_ewise_add_masked",
            Self::VEwiseMultMasked { .. } => "v_ewise_mult_masked",
            Self::VAssignMasked { .. } => "v_assign_masked",
            Self::VReduce { .. } => "v_reduce",
            Self::VMap { .. } => "v_map",
            Self::MBuild { .. } => "m_build",
            Self::MTranspose { .. } => "m_transpose",
            Self::ScalarReduce { .. } => "scalar_reduce",
        }
    }

    /// Input containers in the order algorithm signatures describe them
    pub fn inputs(&self) -> SmallVec<[ArgRef<'a, T>; 4]> {
        let mut args: SmallVec<[ArgRef<'a, T>; 4]> = SmallVec::new();
        match self {
            Self::VxmMasked { v, m, mask, .. } => {
                args.push(ArgRef::Vector(*v));
                args.push(ArgRef::Matrix(*m));
                args.push(ArgRef::Vector(*mask));
            }
            Self::VEwiseAddMasked { a, b, mask, .. }
            | Self::VEwiseMultMasked { a, b, mask, .. } => {
                args.push(ArgRef::Vector(*a));
                args.push(ArgRef::Vector(*b));
                if let Some(mask) = mask {
                    args.push(ArgRef::Vector(*mask));
                }
            }
            Self::VAssignMasked { mask, .. } => {
                args.push(ArgRef::Vector(*mask));
            }
            Self::VReduce { v, .. } => {
                args.push(ArgRef::Vector(*v));
            }
            Self::VMap { v, .. } => {
                args.push(ArgRef::Vector(*v));
            }
            Self::MBuild { .. } | Self::ScalarReduce { .. } => {}
            Self::MTranspose { m, .. } => {
                args.push(ArgRef::Matrix(*m));
            }
        }
        args
    }
}
