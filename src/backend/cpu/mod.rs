//! Host kernels
//!
//! Sequential reference implementations of every dispatched operation.
//! Each kernel is a unit struct implementing
//! [`Algorithm`](crate::dispatch::Algorithm) for all element types; the
//! signature it reports adapts to the formats its inputs currently hold
//! so the dispatcher can prefer the conversion-free path.

mod assign;
mod build;
mod ewise_add;
mod ewise_mult;
mod map;
mod reduce;
mod transpose;
mod vxm;

use crate::dispatch::AlgorithmRegistry;
use crate::dtype::Element;
use std::sync::Arc;

/// Register every host algorithm, in priority order per operation
pub fn register<T: Element>(reg: &mut AlgorithmRegistry<T>) {
    reg.add(Arc::new(vxm::VxmMaskedHost));
    reg.add(Arc::new(ewise_add::VEwiseAddMaskedHost));
    reg.add(Arc::new(ewise_mult::VEwiseMultMaskedHost));
    reg.add(Arc::new(assign::VAssignMaskedHost));
    reg.add(Arc::new(reduce::VReduceHost));
    reg.add(Arc::new(reduce::ScalarReduceHost));
    reg.add(Arc::new(map::VMapHost));
    reg.add(Arc::new(build::MBuildHost));
    reg.add(Arc::new(transpose::MTransposeHost));
}

use crate::block::VectorFormat;
use crate::container::Vector;

/// Format preference for a vector input: keep whichever of COO/dense is
/// already materialised, defaulting to COO
pub(crate) fn resident_format<T: Element>(v: &Vector<T>) -> VectorFormat {
    match v.storage() {
        Ok(st) if st.is_valid(VectorFormat::Dense) && !st.is_valid(VectorFormat::Coo) => {
            VectorFormat::Dense
        }
        _ => VectorFormat::Coo,
    }
}
