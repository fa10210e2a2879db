//! Host bulk build

use crate::backend::Backend;
use crate::block::MatrixFormat;
use crate::dispatch::{Algorithm, Signature, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Populate a matrix's COO slot from coordinate triplets
///
/// Validates sizes and coordinate ranges, installs the triplets with
/// write-discard, and canonicalizes (sort plus duplicate merge with the
/// container's reduce operator).
pub struct MBuildHost;

impl<T: Element> Algorithm<T> for MBuildHost {
    fn name(&self) -> &'static str {
        "m_build"
    }

    fn description(&self) -> &'static str {
        "bulk matrix build from triplets"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        matches!(task, Task::MBuild { .. }).then(Signature::empty)
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::MBuild {
            r,
            rows,
            cols,
            values,
        } = task
        else {
            return Err(Error::invalid_argument("task", "expected m_build"));
        };

        if rows.len() != values.len() || cols.len() != values.len() {
            return Err(Error::invalid_argument(
                "keys",
                format!(
                    "{} row keys, {} col keys, {} values",
                    rows.len(),
                    cols.len(),
                    values.len()
                ),
            ));
        }
        if let Some(&bad) = rows.iter().find(|&&i| i >= r.n_rows()) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: r.n_rows(),
            });
        }
        if let Some(&bad) = cols.iter().find(|&&j| j >= r.n_cols()) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: r.n_cols(),
            });
        }

        let mut r_st = r.storage_mut()?;
        r_st.validate_wd(MatrixFormat::Coo)?;
        let reduce = r_st.reduce().clone();
        let coo = r_st.coo_mut()?;
        coo.ai = rows.to_vec();
        coo.aj = cols.to_vec();
        coo.ax = values.to_vec();
        coo.canonicalize(|a, b| reduce.apply(a, b));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::container::Matrix;
    use crate::error::Error;
    use crate::op;

    #[test]
    fn test_build_read_round_trip() {
        let m = Matrix::<i32>::new(4, 4);
        m.build(&[0, 2, 3], &[1, 2, 0], &[1, 5, 9]).unwrap();

        let view = m.read().unwrap();
        assert_eq!(view.row_indices(), &[0, 2, 3]);
        assert_eq!(view.col_indices(), &[1, 2, 0]);
        assert_eq!(view.values(), &[1, 5, 9]);
    }

    #[test]
    fn test_build_sorts_unsorted_input() {
        let m = Matrix::<i32>::new(3, 3);
        m.build(&[2, 0, 1], &[0, 2, 1], &[3, 1, 2]).unwrap();

        let view = m.read().unwrap();
        assert_eq!(view.row_indices(), &[0, 1, 2]);
        assert_eq!(view.col_indices(), &[2, 1, 0]);
        assert_eq!(view.values(), &[1, 2, 3]);
    }

    #[test]
    fn test_build_merges_duplicates_with_reduce() {
        let m = Matrix::<i32>::new(2, 2);
        m.set_reduce(op::plus()).unwrap();
        m.build(&[0, 0], &[1, 1], &[4, 6]).unwrap();

        assert_eq!(m.get_int(0, 1).unwrap(), 10);
        assert_eq!(m.nvals().unwrap(), 1);
    }

    #[test]
    fn test_build_size_mismatch() {
        let m = Matrix::<i32>::new(2, 2);
        assert!(matches!(
            m.build(&[0, 1], &[0], &[1, 2]),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_build_out_of_range() {
        let m = Matrix::<i32>::new(2, 2);
        assert!(m.build(&[5], &[0], &[1]).is_err());
        assert!(m.build(&[0], &[7], &[1]).is_err());
    }

    #[test]
    fn test_build_replaces_prior_content() {
        let m = Matrix::<i32>::new(3, 3);
        m.set_int(0, 0, 42).unwrap();
        m.build(&[1], &[1], &[7]).unwrap();

        assert_eq!(m.get_int(0, 0).unwrap(), 0);
        assert_eq!(m.get_int(1, 1).unwrap(), 7);
        assert_eq!(m.nvals().unwrap(), 1);
    }
}
