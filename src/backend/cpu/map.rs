//! Host element-wise unary map

use crate::backend::Backend;
use crate::block::VectorFormat;
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Apply a unary operator element-wise
///
/// A dense input maps every index; a sparse input maps only stored
/// entries, leaving the output's fill untouched.
pub struct VMapHost;

impl<T: Element> Algorithm<T> for VMapHost {
    fn name(&self) -> &'static str {
        "v_map"
    }

    fn description(&self) -> &'static str {
        "sequential element-wise map"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        let Task::VMap { v, .. } = task else {
            return None;
        };
        Some(Signature::new([SlotReq::Vector(super::resident_format(v))]))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VMap { r, v, op } = task else {
            return Err(Error::invalid_argument("task", "expected v_map"));
        };

        if v.n_rows() != r.n_rows() {
            return Err(Error::invalid_argument(
                "v",
                "map input and output must have equal length",
            ));
        }

        let v_fmt = super::resident_format(v);
        v.storage_mut()?.validate_rw(v_fmt)?;
        r.storage_mut()?.validate_wd(v_fmt)?;

        let v_st = v.storage()?;
        let mut r_st = r.storage_mut()?;

        match v_fmt {
            VectorFormat::Coo => {
                let v_coo = v_st.coo()?;
                let r_coo = r_st.coo_mut()?;
                r_coo.ai = v_coo.ai.clone();
                r_coo.ax = v_coo.ax.iter().map(|&x| op.apply(x)).collect();
            }
            _ => {
                let v_d = &v_st.dense()?.ax;
                let r_d = r_st.dense_mut()?;

                #[cfg(feature = "rayon")]
                {
                    use rayon::prelude::*;
                    r_d.ax
                        .par_iter_mut()
                        .enumerate()
                        .for_each(|(i, cell)| *cell = op.apply(v_d[i]));
                }
                #[cfg(not(feature = "rayon"))]
                {
                    for (i, cell) in r_d.ax.iter_mut().enumerate() {
                        *cell = op.apply(v_d[i]);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::container::Vector;
    use crate::exec::exec_v_map;
    use crate::op;

    #[test]
    fn test_sparse_map() {
        let v = Vector::<f32>::new(6);
        v.build(&[1, 4], &[2.0, 8.0]).unwrap();

        let r = Vector::<f32>::new(6);
        exec_v_map(&r, &v, op::reciprocal()).unwrap();

        let view = r.read().unwrap();
        assert_eq!(view.indices(), &[1, 4]);
        assert_eq!(view.values(), &[0.5, 0.125]);
    }

    #[test]
    fn test_dense_map() {
        let v = Vector::<f32>::new(3);
        v.build(&[0, 1, 2], &[1.0, 2.0, 4.0]).unwrap();
        v.storage_mut()
            .unwrap()
            .validate_rwd(crate::block::VectorFormat::Dense)
            .unwrap();

        let r = Vector::<f32>::new(3);
        exec_v_map(&r, &v, op::reciprocal()).unwrap();

        assert_eq!(r.get_float(0).unwrap(), 1.0);
        assert_eq!(r.get_float(1).unwrap(), 0.5);
        assert_eq!(r.get_float(2).unwrap(), 0.25);
    }

    #[test]
    fn test_identity_map_preserves() {
        let v = Vector::<i32>::new(4);
        v.build(&[2], &[9]).unwrap();
        let r = Vector::<i32>::new(4);
        exec_v_map(&r, &v, op::identity()).unwrap();
        assert_eq!(r.get_int(2).unwrap(), 9);
    }
}
