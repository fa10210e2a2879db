//! Host masked element-wise add (union combine)

use crate::backend::Backend;
use crate::block::{CooVec, VectorFormat};
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::op::{OpBinary, OpSelect};

/// Keep the entries of `x` whose index is stored in `mask` with a
/// selected value; lock-step merge over the two sorted index streams
fn mask_filter<T: Element>(x: &CooVec<T>, mask: &CooVec<T>, select: &OpSelect<T>) -> CooVec<T> {
    let mut out = CooVec::new();
    let (mut p, mut q) = (0usize, 0usize);
    while p < x.nvals() && q < mask.nvals() {
        match x.ai[p].cmp(&mask.ai[q]) {
            std::cmp::Ordering::Less => p += 1,
            std::cmp::Ordering::Greater => q += 1,
            std::cmp::Ordering::Equal => {
                if select.test(mask.ax[q]) {
                    out.ai.push(x.ai[p]);
                    out.ax.push(x.ax[p]);
                }
                p += 1;
                q += 1;
            }
        }
    }
    out
}

/// Union merge of two sorted streams; matched indices combine with `op`
fn union_merge<T: Element>(a: &CooVec<T>, b: &CooVec<T>, op: &OpBinary<T>) -> CooVec<T> {
    let mut out = CooVec::new();
    let (mut p, mut q) = (0usize, 0usize);
    while p < a.nvals() && q < b.nvals() {
        match a.ai[p].cmp(&b.ai[q]) {
            std::cmp::Ordering::Less => {
                out.ai.push(a.ai[p]);
                out.ax.push(a.ax[p]);
                p += 1;
            }
            std::cmp::Ordering::Greater => {
                out.ai.push(b.ai[q]);
                out.ax.push(b.ax[q]);
                q += 1;
            }
            std::cmp::Ordering::Equal => {
                out.ai.push(a.ai[p]);
                out.ax.push(op.apply(a.ax[p], b.ax[q]));
                p += 1;
                q += 1;
            }
        }
    }
    while p < a.nvals() {
        out.ai.push(a.ai[p]);
        out.ax.push(a.ax[p]);
        p += 1;
    }
    while q < b.nvals() {
        out.ai.push(b.ai[q]);
        out.ax.push(b.ax[q]);
        q += 1;
    }
    out
}

fn dense_mode<T: Element>(task: &Task<'_, T>) -> bool {
    let (Task::VEwiseAddMasked { a, b, .. } | Task::VEwiseMultMasked { a, b, .. }) = task else {
        return false;
    };
    let both_dense = |x: &crate::container::Vector<T>| {
        x.storage()
            .map(|st| st.is_valid(VectorFormat::Dense))
            .unwrap_or(false)
    };
    both_dense(a) && both_dense(b)
}

pub(super) fn ewise_signature<T: Element>(task: &Task<'_, T>) -> Option<Signature> {
    let (Task::VEwiseAddMasked { mask, .. } | Task::VEwiseMultMasked { mask, .. }) = task else {
        return None;
    };
    let fmt = if dense_mode(task) {
        VectorFormat::Dense
    } else {
        VectorFormat::Coo
    };
    let mut reqs = vec![SlotReq::Vector(fmt), SlotReq::Vector(fmt)];
    if mask.is_some() {
        reqs.push(SlotReq::Vector(fmt));
    }
    Some(Signature::new(reqs))
}

/// Sequential union combine with optional mask
///
/// Sparse inputs go through a two-pointer merge: each side is first
/// filtered against the mask's key stream, an empty side short-circuits
/// to a copy of the other, and the surviving streams merge with `op` on
/// matched indices. Dense inputs use a straight index-parallel apply.
pub struct VEwiseAddMaskedHost;

impl<T: Element> Algorithm<T> for VEwiseAddMaskedHost {
    fn name(&self) -> &'static str {
        "v_ewise_add_masked"
    }

    fn description(&self) -> &'static str {
        "sequential masked element-wise union combine"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        matches!(task, Task::VEwiseAddMasked { .. })
            .then(|| ewise_signature(task))
            .flatten()
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VEwiseAddMasked {
            r,
            mask,
            a,
            b,
            op,
            op_select,
        } = task
        else {
            return Err(Error::invalid_argument("task", "expected v_ewise_add_masked"));
        };

        if a.n_rows() != r.n_rows() || b.n_rows() != r.n_rows() {
            return Err(Error::invalid_argument(
                "a",
                "element-wise operands must share the output length",
            ));
        }

        if dense_mode(task) {
            execute_dense(r, *mask, a, b, op, op_select)
        } else {
            execute_sparse(r, *mask, a, b, op, op_select)
        }
    }
}

fn execute_sparse<T: Element>(
    r: &crate::container::Vector<T>,
    mask: Option<&crate::container::Vector<T>>,
    a: &crate::container::Vector<T>,
    b: &crate::container::Vector<T>,
    op: &OpBinary<T>,
    op_select: &OpSelect<T>,
) -> Result<()> {
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
            let a_kept = mask_filter(a_coo, mask_coo, op_select);
            let b_kept = mask_filter(b_coo, mask_coo, op_select);
            if a_kept.nvals() == 0 {
                b_kept
            } else if b_kept.nvals() == 0 {
                a_kept
            } else {
                union_merge(&a_kept, &b_kept, op)
            }
        }
        None => {
            if a_coo.nvals() == 0 {
                b_coo.clone()
            } else if b_coo.nvals() == 0 {
                a_coo.clone()
            } else {
                union_merge(a_coo, b_coo, op)
            }
        }
    };

    let mut r_st = r.storage_mut()?;
    r_st.validate_wd(VectorFormat::Coo)?;
    *r_st.coo_mut()? = merged;
    Ok(())
}

pub(super) fn execute_dense<T: Element>(
    r: &crate::container::Vector<T>,
    mask: Option<&crate::container::Vector<T>>,
    a: &crate::container::Vector<T>,
    b: &crate::container::Vector<T>,
    op: &OpBinary<T>,
    op_select: &OpSelect<T>,
) -> Result<()> {
    a.storage_mut()?.validate_rw(VectorFormat::Dense)?;
    b.storage_mut()?.validate_rw(VectorFormat::Dense)?;
    if let Some(mask) = mask {
        mask.storage_mut()?.validate_rw(VectorFormat::Dense)?;
    }
    r.storage_mut()?.validate_wd(VectorFormat::Dense)?;

    let a_st = a.storage()?;
    let b_st = b.storage()?;
    let mask_st = match mask {
        Some(mask) => Some(mask.storage()?),
        None => None,
    };
    let mut r_st = r.storage_mut()?;

    let a_d = &a_st.dense()?.ax;
    let b_d = &b_st.dense()?.ax;
    let mask_d = match mask_st.as_ref() {
        Some(st) => Some(&st.dense()?.ax),
        None => None,
    };
    let fill = r_st.fill_value();
    let r_d = r_st.dense_mut()?;

    let apply = |i: usize, cell: &mut T| {
        let selected = mask_d.map_or(true, |m| op_select.test(m[i]));
        *cell = if selected { op.apply(a_d[i], b_d[i]) } else { fill };
    };

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        r_d.ax
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, cell)| apply(i, cell));
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (i, cell) in r_d.ax.iter_mut().enumerate() {
            apply(i, cell);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::container::Vector;
    use crate::exec::exec_v_ewise_add_masked;
    use crate::op;

    #[test]
    fn test_union_merge_unmasked() {
        let a = Vector::<i32>::new(6);
        a.build(&[0, 2], &[5, 7]).unwrap();
        let b = Vector::<i32>::new(6);
        b.build(&[1, 2], &[3, 4]).unwrap();

        let r = Vector::<i32>::new(6);
        exec_v_ewise_add_masked(&r, None, &a, &b, op::plus(), op::always_true()).unwrap();

        let view = r.read().unwrap();
        assert_eq!(view.indices(), &[0, 1, 2]);
        assert_eq!(view.values(), &[5, 3, 11]);
    }

    #[test]
    fn test_masked_union_merge() {
        let a = Vector::<i32>::new(8);
        a.build(&[0, 2], &[5, 7]).unwrap();
        let b = Vector::<i32>::new(8);
        b.build(&[1, 2], &[3, 4]).unwrap();
        let mask = Vector::<i32>::new(8);
        mask.build(&[1, 2], &[1, 1]).unwrap();

        let r = Vector::<i32>::new(8);
        exec_v_ewise_add_masked(&r, Some(&mask), &a, &b, op::plus(), op::nonzero()).unwrap();

        let view = r.read().unwrap();
        assert_eq!(view.indices(), &[1, 2]);
        assert_eq!(view.values(), &[3, 11]);
    }

    #[test]
    fn test_empty_side_short_circuits() {
        let a = Vector::<i32>::new(4);
        let b = Vector::<i32>::new(4);
        b.build(&[3], &[9]).unwrap();

        let r = Vector::<i32>::new(4);
        exec_v_ewise_add_masked(&r, None, &a, &b, op::plus(), op::always_true()).unwrap();

        let view = r.read().unwrap();
        assert_eq!(view.indices(), &[3]);
        assert_eq!(view.values(), &[9]);
    }

    #[test]
    fn test_dense_inputs_apply_index_parallel() {
        let a = Vector::<f32>::new(3);
        a.build(&[0, 1, 2], &[1.0, 2.0, 3.0]).unwrap();
        a.set_format(crate::block::VectorFormat::Dense).unwrap();
        let b = Vector::<f32>::new(3);
        b.build(&[0, 1, 2], &[10.0, 20.0, 30.0]).unwrap();
        b.set_format(crate::block::VectorFormat::Dense).unwrap();

        let r = Vector::<f32>::new(3);
        exec_v_ewise_add_masked(&r, None, &a, &b, op::min(), op::always_true()).unwrap();

        assert_eq!(r.get_float(0).unwrap(), 1.0);
        assert_eq!(r.get_float(2).unwrap(), 3.0);
    }
}
