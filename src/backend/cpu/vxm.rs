//! Host masked vector-matrix product

use crate::backend::Backend;
use crate::block::{MatrixFormat, VectorFormat};
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Sequential masked vxm over a CSR matrix
///
/// Traverses the active entries of `v` row by row and accumulates
/// `op_add(r[j], op_multiply(v[i], m[i,j]))` into a dense output,
/// honouring the mask predicate and the early-exit hint. Accepts the
/// frontier in COO or dense form, whichever is resident.
pub struct VxmMaskedHost;

impl<T: Element> Algorithm<T> for VxmMaskedHost {
    fn name(&self) -> &'static str {
        "vxm_masked"
    }

    fn description(&self) -> &'static str {
        "sequential masked vector-matrix product"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        let Task::VxmMasked { v, .. } = task else {
            return None;
        };
        Some(Signature::new([
            SlotReq::Vector(super::resident_format(v)),
            SlotReq::Matrix(MatrixFormat::Csr),
            SlotReq::Vector(VectorFormat::Dense),
        ]))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VxmMasked {
            r,
            mask,
            v,
            m,
            op_multiply,
            op_add,
            op_select,
            init,
            desc,
        } = task
        else {
            return Err(Error::invalid_argument("task", "expected vxm_masked"));
        };

        if v.n_rows() != m.n_rows() {
            return Err(Error::invalid_argument(
                "v",
                format!("length {} for matrix of {} rows", v.n_rows(), m.n_rows()),
            ));
        }
        if r.n_rows() != m.n_cols() || mask.n_rows() != m.n_cols() {
            return Err(Error::invalid_argument(
                "r",
                format!(
                    "output and mask must have length {} (matrix columns)",
                    m.n_cols()
                ),
            ));
        }

        let v_fmt = super::resident_format(v);
        v.storage_mut()?.validate_rw(v_fmt)?;
        m.storage_mut()?.validate_rw(MatrixFormat::Csr)?;
        mask.storage_mut()?.validate_rw(VectorFormat::Dense)?;
        r.storage_mut()?.validate_wd(VectorFormat::Dense)?;

        let v_st = v.storage()?;
        let m_st = m.storage()?;
        let mask_st = mask.storage()?;
        let mut r_st = r.storage_mut()?;

        let csr = m_st.csr()?;
        let mask_d = mask_st.dense()?;
        let fill_v = v_st.fill_value();
        let init = *init;

        let r_d = r_st.dense_mut()?;
        for cell in r_d.ax.iter_mut() {
            *cell = init;
        }

        match v_fmt {
            VectorFormat::Coo => {
                let v_coo = v_st.coo()?;
                for k in 0..v_coo.nvals() {
                    let i = v_coo.ai[k];
                    let vi = v_coo.ax[k];
                    for e in csr.row_range(i) {
                        let j = csr.aj[e] as usize;
                        if !op_select.test(mask_d.ax[j]) {
                            continue;
                        }
                        if desc.early_exit && r_d.ax[j] != init {
                            continue;
                        }
                        r_d.ax[j] = op_add.apply(r_d.ax[j], op_multiply.apply(vi, csr.ax[e]));
                    }
                }
            }
            _ => {
                let v_d = v_st.dense()?;
                for (i, &vi) in v_d.ax.iter().enumerate() {
                    if vi == fill_v {
                        continue;
                    }
                    for e in csr.row_range(i as u32) {
                        let j = csr.aj[e] as usize;
                        if !op_select.test(mask_d.ax[j]) {
                            continue;
                        }
                        if desc.early_exit && r_d.ax[j] != init {
                            continue;
                        }
                        r_d.ax[j] = op_add.apply(r_d.ax[j], op_multiply.apply(vi, csr.ax[e]));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{Matrix, Scalar, Vector};
    use crate::descriptor::Descriptor;
    use crate::exec::exec_vxm_masked;
    use crate::op;

    #[test]
    fn test_vxm_plus_times_unmasked() {
        // [1, 2]
        // [0, 3]
        let m = Matrix::<f32>::new(2, 2);
        m.build(&[0, 0, 1], &[0, 1, 1], &[1.0, 2.0, 3.0]).unwrap();

        let v = Vector::<f32>::new(2);
        v.build(&[0, 1], &[10.0, 100.0]).unwrap();

        let mask = Vector::<f32>::new(2);
        let r = Vector::<f32>::new(2);

        exec_vxm_masked(
            &r,
            &mask,
            &v,
            &m,
            op::times(),
            op::plus(),
            op::always_true(),
            &Scalar::from_value(0.0),
            Descriptor::default(),
        )
        .unwrap();

        // r[0] = 10*1, r[1] = 10*2 + 100*3
        assert_eq!(r.get_float(0).unwrap(), 10.0);
        assert_eq!(r.get_float(1).unwrap(), 320.0);
    }

    #[test]
    fn test_vxm_mask_restricts_columns() {
        let m = Matrix::<i32>::new(2, 3);
        m.build(&[0, 0, 0], &[0, 1, 2], &[1, 1, 1]).unwrap();

        let v = Vector::<i32>::new(2);
        v.set_int(0, 5).unwrap();

        // only column 1 selected
        let mask = Vector::<i32>::new(3);
        mask.set_int(1, 1).unwrap();

        let r = Vector::<i32>::new(3);
        exec_vxm_masked(
            &r,
            &mask,
            &v,
            &m,
            op::times(),
            op::plus(),
            op::nonzero(),
            &Scalar::from_value(0),
            Descriptor::default(),
        )
        .unwrap();

        assert_eq!(r.get_int(0).unwrap(), 0);
        assert_eq!(r.get_int(1).unwrap(), 5);
        assert_eq!(r.get_int(2).unwrap(), 0);
    }

    #[test]
    fn test_vxm_repeat_is_deterministic() {
        let m = Matrix::<i32>::new(3, 3);
        m.build(&[0, 1, 2, 2], &[1, 2, 0, 1], &[2, 3, 4, 5]).unwrap();
        let v = Vector::<i32>::new(3);
        v.build(&[0, 1, 2], &[1, 1, 1]).unwrap();
        let mask = Vector::<i32>::new(3);

        let collect = || {
            let r = Vector::<i32>::new(3);
            exec_vxm_masked(
                &r,
                &mask,
                &v,
                &m,
                op::times(),
                op::plus(),
                op::always_true(),
                &Scalar::from_value(0),
                Descriptor::default(),
            )
            .unwrap();
            (0..3).map(|i| r.get_int(i).unwrap()).collect::<Vec<_>>()
        };

        let first = collect();
        for _ in 0..3 {
            assert_eq!(collect(), first);
        }
    }

    #[test]
    fn test_vxm_dimension_mismatch() {
        let m = Matrix::<i32>::new(2, 2);
        let v = Vector::<i32>::new(3);
        let mask = Vector::<i32>::new(2);
        let r = Vector::<i32>::new(2);
        assert!(exec_vxm_masked(
            &r,
            &mask,
            &v,
            &m,
            op::times(),
            op::plus(),
            op::always_true(),
            &Scalar::from_value(0),
            Descriptor::default(),
        )
        .is_err());
    }
}
