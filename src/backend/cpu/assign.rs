//! Host masked vector assignment

use crate::backend::Backend;
use crate::block::VectorFormat;
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Sequential masked assignment into a dense output
///
/// Two code paths, chosen by the mask's resident format: a sparse mask
/// iterates its stored entries, a dense mask sweeps every index.
pub struct VAssignMaskedHost;

impl<T: Element> Algorithm<T> for VAssignMaskedHost {
    fn name(&self) -> &'static str {
        "v_assign_masked"
    }

    fn description(&self) -> &'static str {
        "sequential masked vector assignment"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        let Task::VAssignMasked { mask, .. } = task else {
            return None;
        };
        Some(Signature::new([SlotReq::Vector(super::resident_format(
            mask,
        ))]))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VAssignMasked {
            r,
            mask,
            value,
            op_assign,
            op_select,
        } = task
        else {
            return Err(Error::invalid_argument("task", "expected v_assign_masked"));
        };

        if mask.n_rows() != r.n_rows() {
            return Err(Error::invalid_argument(
                "mask",
                "mask and output must have equal length",
            ));
        }

        let mask_fmt = super::resident_format(mask);
        mask.storage_mut()?.validate_rw(mask_fmt)?;
        r.storage_mut()?.validate_rwd(VectorFormat::Dense)?;

        let mask_st = mask.storage()?;
        let mut r_st = r.storage_mut()?;
        let r_d = r_st.dense_mut()?;
        let value = *value;

        match mask_fmt {
            VectorFormat::Coo => {
                let mask_coo = mask_st.coo()?;
                for k in 0..mask_coo.nvals() {
                    if op_select.test(mask_coo.ax[k]) {
                        let i = mask_coo.ai[k] as usize;
                        r_d.ax[i] = op_assign.apply(r_d.ax[i], value);
                    }
                }
            }
            _ => {
                let mask_d = mask_st.dense()?;
                for (i, &mx) in mask_d.ax.iter().enumerate() {
                    if op_select.test(mx) {
                        r_d.ax[i] = op_assign.apply(r_d.ax[i], value);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{Scalar, Vector};
    use crate::exec::exec_v_assign_masked;
    use crate::op;

    #[test]
    fn test_sparse_mask_assign() {
        let r = Vector::<i32>::new(5);
        let mask = Vector::<i32>::new(5);
        mask.build(&[1, 3], &[1, 1]).unwrap();

        exec_v_assign_masked(&r, &mask, &Scalar::from_value(7), op::second(), op::nonzero())
            .unwrap();

        assert_eq!(r.get_int(0).unwrap(), 0);
        assert_eq!(r.get_int(1).unwrap(), 7);
        assert_eq!(r.get_int(3).unwrap(), 7);
    }

    #[test]
    fn test_dense_mask_assign_combines_with_old() {
        let r = Vector::<i32>::new(3);
        r.build(&[0, 1, 2], &[10, 20, 30]).unwrap();

        let mask = Vector::<i32>::new(3);
        mask.build(&[0, 1, 2], &[1, 0, 1]).unwrap();
        // leave only the dense slot resident to force the dense path
        mask.storage_mut()
            .unwrap()
            .validate_rwd(crate::block::VectorFormat::Dense)
            .unwrap();

        exec_v_assign_masked(&r, &mask, &Scalar::from_value(5), op::plus(), op::nonzero())
            .unwrap();

        assert_eq!(r.get_int(0).unwrap(), 15);
        assert_eq!(r.get_int(1).unwrap(), 20);
        assert_eq!(r.get_int(2).unwrap(), 35);
    }

    #[test]
    fn test_select_filters_mask_values() {
        let r = Vector::<i32>::new(4);
        let mask = Vector::<i32>::new(4);
        mask.build(&[0, 1], &[0, 2]).unwrap();

        exec_v_assign_masked(&r, &mask, &Scalar::from_value(9), op::second(), op::nonzero())
            .unwrap();

        assert_eq!(r.get_int(0).unwrap(), 0);
        assert_eq!(r.get_int(1).unwrap(), 9);
    }
}
