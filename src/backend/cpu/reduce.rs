//! Host reductions

use crate::backend::Backend;
use crate::block::VectorFormat;
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Sequential fold of a vector's stored entries into a scalar
pub struct VReduceHost;

impl<T: Element> Algorithm<T> for VReduceHost {
    fn name(&self) -> &'static str {
        "v_reduce"
    }

    fn description(&self) -> &'static str {
        "sequential vector fold"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        let Task::VReduce { v, .. } = task else {
            return None;
        };
        Some(Signature::new([SlotReq::Vector(super::resident_format(v))]))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VReduce {
            r,
            init,
            v,
            op_reduce,
        } = task
        else {
            return Err(Error::invalid_argument("task", "expected v_reduce"));
        };

        let v_fmt = super::resident_format(v);
        v.storage_mut()?.validate_rw(v_fmt)?;
        let v_st = v.storage()?;

        let mut acc = *init;
        match v_fmt {
            VectorFormat::Coo => {
                for &x in &v_st.coo()?.ax {
                    acc = op_reduce.apply(acc, x);
                }
            }
            _ => {
                for &x in &v_st.dense()?.ax {
                    acc = op_reduce.apply(acc, x);
                }
            }
        }

        r.set_value(acc);
        Ok(())
    }
}

/// Scalar combine `r = op_reduce(a, b)`
pub struct ScalarReduceHost;

impl<T: Element> Algorithm<T> for ScalarReduceHost {
    fn name(&self) -> &'static str {
        "scalar_reduce"
    }

    fn description(&self) -> &'static str {
        "scalar combine"
    }

    fn backend(&self) -> Backend {
        Backend::Host
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        matches!(task, Task::ScalarReduce { .. }).then(Signature::empty)
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::ScalarReduce { r, a, b, op_reduce } = task else {
            return Err(Error::invalid_argument("task", "expected scalar_reduce"));
        };
        r.set_value(op_reduce.apply(a.get_value(), b.get_value()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{Scalar, Vector};
    use crate::exec::{exec_scalar_reduce, exec_v_reduce};
    use crate::op;

    #[test]
    fn test_sparse_reduce_folds_stored_entries() {
        let v = Vector::<i32>::new(100);
        v.build(&[3, 50, 99], &[1, 2, 3]).unwrap();

        let r = Scalar::new();
        exec_v_reduce(&r, &Scalar::from_value(10), &v, op::plus()).unwrap();
        assert_eq!(r.get_value(), 16);
    }

    #[test]
    fn test_dense_reduce_includes_fill_slots() {
        let v = Vector::<f32>::new(3);
        v.build(&[0, 1, 2], &[1.0, 5.0, 2.0]).unwrap();
        v.storage_mut()
            .unwrap()
            .validate_rwd(crate::block::VectorFormat::Dense)
            .unwrap();

        let r = Scalar::new();
        exec_v_reduce(&r, &Scalar::from_value(f32::INFINITY), &v, op::min()).unwrap();
        assert_eq!(r.get_value(), 1.0);
    }

    #[test]
    fn test_empty_vector_reduces_to_init() {
        let v = Vector::<i32>::new(5);
        let r = Scalar::new();
        exec_v_reduce(&r, &Scalar::from_value(-3), &v, op::plus()).unwrap();
        assert_eq!(r.get_value(), -3);
    }

    #[test]
    fn test_scalar_reduce() {
        let r = Scalar::new();
        exec_scalar_reduce(
            &r,
            &Scalar::from_value(4i32),
            &Scalar::from_value(9),
            op::max(),
        )
        .unwrap();
        assert_eq!(r.get_value(), 9);
    }
}
