//! Host masked element-wise multiply (intersection combine)

use super::ewise_add::{ewise_signature, execute_dense};
use crate::backend::Backend;
use crate::block::{CooVec, VectorFormat};
use crate::dispatch::{Algorithm, Signature, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::op::{OpBinary, OpSelect};

/// Intersection merge of two sorted streams; only matched indices
/// survive, combined with `op`, and optionally gated by the mask stream
fn intersect_merge<T: Element>(
    a: &CooVec<T>,
    b: &CooVec<T>,
    mask: Option<(&CooVec<T>, &OpSelect<T>)>,
    op: &OpBinary<T>,
) -> CooVec<T> {
    let mut out = CooVec::new();
    let (mut p, mut q) = (0usize, 0usize);
    let mut m = 0usize;
    while p < a.nvals() && q < b.nvals() {
        match a.ai[p].cmp(&b.ai[q]) {
            std::cmp::Ordering::Less => p += 1,
            std::cmp::Ordering::Greater => q += 1,
            std::cmp::Ordering::Equal => {
                let i = a.ai[p];
                let selected = match mask {
                    None => true,
                    Some((mask, select)) => {
                        while m < mask.nvals() && mask.ai[m] < i {
                            m += 1;
                        }
                        m < mask.nvals() && mask.ai[m] == i && select.test(mask.ax[m])
                    }
                };
                if selected {
                    out.ai.push(i);
                    out.ax.push(op.apply(a.ax[p], b.ax[q]));
                }
                p += 1;
                q += 1;
            }
        }
    }
    out
}

/// Sequential intersection combine with optional mask
///
/// Only indices stored on both sides produce output; dense inputs fall
/// back to the index-parallel apply shared with the union kernel.
pub struct VEwiseMultMaskedHost;

impl<T: Element> Algorithm<T> for VEwiseMultMaskedHost {
    fn name(&self) -> &'static str {
        "v_ewise_mult_masked"
    }

    fn description(&self) -> &'static str {
        "sequential masked element-wise intersection combine"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        matches!(task, Task::VEwiseMultMasked { .. })
            .then(|| ewise_signature(task))
            .flatten()
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VEwiseMultMasked {
            r,
            mask,
            a,
            b,
            op,
            op_select,
        } = task
        else {
            return Err(Error::invalid_argument(
                "task",
                "expected v_ewise_mult_masked",
            ));
        };

        if a.n_rows() != r.n_rows() || b.n_rows() != r.n_rows() {
            return Err(Error::invalid_argument(
                "a",
                "element-wise operands must share the output length",
            ));
        }

        let both_dense = [a, b].iter().all(|x| {
            x.storage()
                .map(|st| st.is_valid(VectorFormat::Dense))
                .unwrap_or(false)
        });
        if both_dense {
            return execute_dense(r, *mask, a, b, op, op_select);
        }

        a.storage_mut()?.validate_rw(VectorFormat::Coo)?;
        b.storage_mut()?.validate_rw(VectorFormat::Coo)?;
        if let Some(mask) = mask {
            mask.storage_mut()?.validate_rw(VectorFormat::Coo)?;
        }

        let a_st = a.storage()?;
        let b_st = b.storage()?;
        let a_coo = a_st.coo()?;
        let b_coo = b_st.coo()?;

        let merged = match mask {
            Some(mask) => {
                let mask_st = mask.storage()?;
                let mask_coo = mask_st.coo()?;
                intersect_merge(a_coo, b_coo, Some((mask_coo, op_select)), op)
            }
            None => intersect_merge(a_coo, b_coo, None, op),
        };

        let mut r_st = r.storage_mut()?;
        r_st.validate_wd(VectorFormat::Coo)?;
        *r_st.coo_mut()? = merged;
        Ok(())
    }
}
