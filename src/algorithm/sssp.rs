//! Single-source shortest paths

use crate::container::{Matrix, Scalar, Vector};
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::exec::{exec_v_ewise_add_masked, exec_v_map, exec_v_reduce, exec_vxm_masked};
use crate::op;

/// Bellman-Ford relaxation from `s` over the weighted adjacency `a`
///
/// Edge weights must be non-negative. On return `v[j]` holds the
/// cheapest path cost from `s`; unreachable vertices hold infinity, the
/// vector's fill value. Each round relaxes every reached vertex through
/// the (min, plus) semiring and folds the result into the running
/// distances; iteration stops when the plus-reduction over stored
/// distances stops changing, or after `|V| - 1` rounds.
pub fn sssp(v: &Vector<f32>, a: &Matrix<f32>, s: u32, desc: &Descriptor) -> Result<()> {
    let n = a.n_rows();
    if a.n_cols() != n {
        return Err(Error::invalid_argument("a", "adjacency matrix must be square"));
    }
    if v.n_rows() != n {
        return Err(Error::invalid_argument(
            "v",
            "distance vector length must match the vertex count",
        ));
    }
    if s >= n {
        return Err(Error::IndexOutOfBounds { index: s, size: n });
    }

    v.set_fill_value(f32::INFINITY)?;
    v.set_float(s, 0.0)?;

    let mask = Vector::<f32>::new(n);
    let inf = Scalar::from_value(f32::INFINITY);
    let zero = Scalar::from_value(0.0);

    let cur = Vector::<f32>::new(n);
    cur.set_fill_value(f32::INFINITY)?;
    exec_v_map(&cur, v, op::identity())?;

    let max_rounds = match desc.max_iterations {
        0 => n.saturating_sub(1).max(1),
        cap => cap,
    };

    let mut prev_sum: Option<f32> = None;
    for _ in 0..max_rounds {
        let relaxed = Vector::<f32>::new(n);
        relaxed.set_fill_value(f32::INFINITY)?;
        exec_vxm_masked(
            &relaxed,
            &mask,
            &cur,
            a,
            op::plus(),
            op::min(),
            op::always_true(),
            &inf,
            *desc,
        )?;

        let folded = Vector::<f32>::new(n);
        folded.set_fill_value(f32::INFINITY)?;
        exec_v_ewise_add_masked(&folded, None, &cur, &relaxed, op::min(), op::always_true())?;

        let sum = Scalar::new();
        exec_v_reduce(&sum, &zero, &folded, op::plus())?;

        exec_v_map(&cur, &folded, op::identity())?;

        if prev_sum == Some(sum.get_value()) {
            break;
        }
        prev_sum = Some(sum.get_value());
    }

    exec_v_map(v, &cur, op::identity())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sssp_picks_cheaper_detour() {
        // 0 -> 1 (cost 5), 0 -> 2 (cost 1), 2 -> 1 (cost 1)
        let a = Matrix::<f32>::new(3, 3);
        a.build(&[0, 0, 2], &[1, 2, 1], &[5.0, 1.0, 1.0]).unwrap();

        let v = Vector::<f32>::new(3);
        sssp(&v, &a, 0, &Descriptor::default()).unwrap();

        assert_eq!(v.get_float(0).unwrap(), 0.0);
        assert_eq!(v.get_float(2).unwrap(), 1.0);
        assert_eq!(v.get_float(1).unwrap(), 2.0);
    }

    #[test]
    fn test_sssp_unreachable_stays_infinite() {
        let a = Matrix::<f32>::new(3, 3);
        a.build(&[0], &[1], &[1.0]).unwrap();

        let v = Vector::<f32>::new(3);
        sssp(&v, &a, 0, &Descriptor::default()).unwrap();

        assert!(v.get_float(2).unwrap().is_infinite());
    }
}
