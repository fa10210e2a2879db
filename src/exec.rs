//! Public operation entry points
//!
//! Thin wrappers that package arguments into a [`Task`](crate::dispatch::Task)
//! and hand it to the dispatcher. Each call executes synchronously: when
//! it returns, the output container holds the completed result.

use crate::container::{Matrix, Scalar, Vector};
use crate::descriptor::Descriptor;
use crate::dispatch::{dispatch, Task};
use crate::dtype::Element;
use crate::error::Result;
use crate::op::{OpBinaryRef, OpSelectRef, OpUnaryRef};

/// Masked vector-matrix product
///
/// `r[j] = op_add(r[j], op_multiply(v[i], m[i,j]))` accumulated over the
/// stored entries of `v` and the rows of `m`, restricted to columns `j`
/// with `op_select(mask[j])`. Every output cell starts at `init`'s
/// value. With `desc.early_exit`, a cell stops updating once it differs
/// from the initial value; `op_add` must be commutative and associative
/// for the accelerated paths to be deterministic.
#[allow(clippy::too_many_arguments)]
pub fn exec_vxm_masked<T: Element>(
    r: &Vector<T>,
    mask: &Vector<T>,
    v: &Vector<T>,
    m: &Matrix<T>,
    op_multiply: OpBinaryRef<T>,
    op_add: OpBinaryRef<T>,
    op_select: OpSelectRef<T>,
    init: &Scalar<T>,
    desc: Descriptor,
) -> Result<()> {
    dispatch(&Task::VxmMasked {
        r,
        mask,
        v,
        m,
        op_multiply,
        op_add,
        op_select,
        init: init.get_value(),
        desc,
    })
}

/// Masked element-wise combine over the union of stored indices
///
/// Indices present on one side copy through; indices present on both
/// combine with `op`. A mask of `None` leaves every index writable.
pub fn exec_v_ewise_add_masked<T: Element>(
    r: &Vector<T>,
    mask: Option<&Vector<T>>,
    a: &Vector<T>,
    b: &Vector<T>,
    op: OpBinaryRef<T>,
    op_select: OpSelectRef<T>,
) -> Result<()> {
    dispatch(&Task::VEwiseAddMasked {
        r,
        mask,
        a,
        b,
        op,
        op_select,
    })
}

/// Masked element-wise combine over the intersection of stored indices
pub fn exec_v_ewise_mult_masked<T: Element>(
    r: &Vector<T>,
    mask: Option<&Vector<T>>,
    a: &Vector<T>,
    b: &Vector<T>,
    op: OpBinaryRef<T>,
    op_select: OpSelectRef<T>,
) -> Result<()> {
    dispatch(&Task::VEwiseMultMasked {
        r,
        mask,
        a,
        b,
        op,
        op_select,
    })
}

/// Masked scalar assignment `r[i] ← op_assign(r[i], value)` wherever
/// `op_select(mask[i])`
pub fn exec_v_assign_masked<T: Element>(
    r: &Vector<T>,
    mask: &Vector<T>,
    value: &Scalar<T>,
    op_assign: OpBinaryRef<T>,
    op_select: OpSelectRef<T>,
) -> Result<()> {
    dispatch(&Task::VAssignMasked {
        r,
        mask,
        value: value.get_value(),
        op_assign,
        op_select,
    })
}

/// Fold all stored entries of `v` into `r`, seeded by `init`
///
/// `op_reduce` must be associative; accelerated paths additionally
/// require commutativity.
pub fn exec_v_reduce<T: Element>(
    r: &Scalar<T>,
    init: &Scalar<T>,
    v: &Vector<T>,
    op_reduce: OpBinaryRef<T>,
) -> Result<()> {
    dispatch(&Task::VReduce {
        r,
        init: init.get_value(),
        v,
        op_reduce,
    })
}

/// Element-wise unary map `r[i] = op(v[i])`
pub fn exec_v_map<T: Element>(r: &Vector<T>, v: &Vector<T>, op: OpUnaryRef<T>) -> Result<()> {
    dispatch(&Task::VMap { r, v, op })
}

/// Matrix transposition `r = mᵀ`
pub fn exec_m_transpose<T: Element>(r: &Matrix<T>, m: &Matrix<T>) -> Result<()> {
    dispatch(&Task::MTranspose { r, m })
}

/// Scalar combine `r = op_reduce(a, b)`
pub fn exec_scalar_reduce<T: Element>(
    r: &Scalar<T>,
    a: &Scalar<T>,
    b: &Scalar<T>,
    op_reduce: OpBinaryRef<T>,
) -> Result<()> {
    dispatch(&Task::ScalarReduce { r, a, b, op_reduce })
}
