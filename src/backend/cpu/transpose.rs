//! Host matrix transposition

use crate::backend::Backend;
use crate::block::{CsrMat, MatrixFormat};
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Transpose a CSR matrix by column counting
///
/// One pass counts entries per column, a prefix sum turns counts into
/// the transposed row pointers, and a second pass scatters entries. Row
/// order inside each output row follows input row order, so the result
/// is canonical CSR.
pub struct MTransposeHost;

impl<T: Element> Algorithm<T> for MTransposeHost {
    fn name(&self) -> &'static str {
        "m_transpose"
    }

    fn description(&self) -> &'static str {
        "sequential matrix transposition"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        matches!(task, Task::MTranspose { .. })
            .then(|| Signature::new([SlotReq::Matrix(MatrixFormat::Csr)]))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::MTranspose { r, m } = task else {
            return Err(Error::invalid_argument("task", "expected m_transpose"));
        };

        if r.n_rows() != m.n_cols() || r.n_cols() != m.n_rows() {
            return Err(Error::invalid_argument(
                "r",
                format!(
                    "transpose output must be {}x{}",
                    m.n_cols(),
                    m.n_rows()
                ),
            ));
        }

        m.storage_mut()?.validate_rw(MatrixFormat::Csr)?;
        r.storage_mut()?.validate_wd(MatrixFormat::Csr)?;

        let m_st = m.storage()?;
        let mut r_st = r.storage_mut()?;
        let csr = m_st.csr()?;

        let n_cols = m.n_cols() as usize;
        let nnz = csr.nvals();

        let mut tp = vec![0u32; n_cols + 1];
        for &j in &csr.aj {
            tp[j as usize + 1] += 1;
        }
        for c in 1..=n_cols {
            tp[c] += tp[c - 1];
        }

        let mut tj = vec![0u32; nnz];
        let mut tx = vec![T::zero(); nnz];
        let mut next = tp.clone();
        for i in 0..csr.n_rows() {
            for e in csr.row_range(i as u32) {
                let j = csr.aj[e] as usize;
                let slot = next[j] as usize;
                tj[slot] = i as u32;
                tx[slot] = csr.ax[e];
                next[j] += 1;
            }
        }

        *r_st.csr_mut()? = CsrMat {
            ap: tp,
            aj: tj,
            ax: tx,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::container::Matrix;
    use crate::exec::exec_m_transpose;

    #[test]
    fn test_transpose_rectangular() {
        // [1, 0, 2]
        // [0, 3, 0]
        let m = Matrix::<i32>::new(2, 3);
        m.build(&[0, 0, 1], &[0, 2, 1], &[1, 2, 3]).unwrap();

        let r = Matrix::<i32>::new(3, 2);
        exec_m_transpose(&r, &m).unwrap();

        assert_eq!(r.get_int(0, 0).unwrap(), 1);
        assert_eq!(r.get_int(2, 0).unwrap(), 2);
        assert_eq!(r.get_int(1, 1).unwrap(), 3);
        assert_eq!(r.get_int(0, 1).unwrap(), 0);
        assert_eq!(r.nvals().unwrap(), 3);
    }

    #[test]
    fn test_transpose_shape_mismatch() {
        let m = Matrix::<i32>::new(2, 3);
        let r = Matrix::<i32>::new(2, 3);
        assert!(exec_m_transpose(&r, &m).is_err());
    }

    #[test]
    fn test_transpose_empty() {
        let m = Matrix::<f32>::new(3, 3);
        let r = Matrix::<f32>::new(3, 3);
        exec_m_transpose(&r, &m).unwrap();
        assert_eq!(r.nvals().unwrap(), 0);
    }
}
