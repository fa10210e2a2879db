//! Breadth-first search

use crate::container::{Matrix, Scalar, Vector};
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::exec::{exec_v_assign_masked, exec_vxm_masked};
use crate::op;

/// Depth of an unreached vertex after [`bfs`]
pub const BFS_UNREACHED: i32 = -1;

/// Breadth-first search from `s` over the adjacency matrix `a`
///
/// On return `v[j]` holds the hop distance from `s` (zero at the
/// source); vertices the search never reaches hold [`BFS_UNREACHED`],
/// the vector's fill value. Each level expands the frontier with an
/// early-exit vxm over the (land, lor) semiring masked to unvisited
/// vertices, then stamps the current depth into the newly found set.
/// Terminates after at most diameter-plus-one iterations.
pub fn bfs(v: &Vector<i32>, a: &Matrix<i32>, s: u32, desc: &Descriptor) -> Result<()> {
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

    v.set_fill_value(BFS_UNREACHED)?;
    v.set_int(s, 0)?;

    let visited = Vector::<i32>::new(n);
    visited.set_int(s, 1)?;

    let mut frontier = Vector::<i32>::new(n);
    frontier.set_int(s, 1)?;

    let one = Scalar::from_value(1);
    let zero = Scalar::from_value(0);
    let vxm_desc = Descriptor {
        early_exit: true,
        ..*desc
    };

    let max_depth = match desc.max_iterations {
        0 => n,
        cap => cap,
    };

    for depth in 1..=max_depth {
        let next = Vector::<i32>::new(n);
        exec_vxm_masked(
            &next,
            &visited,
            &frontier,
            a,
            op::land(),
            op::lor(),
            op::equal_zero(),
            &zero,
            vxm_desc,
        )?;

        if next.nvals()? == 0 {
            break;
        }

        exec_v_assign_masked(
            v,
            &next,
            &Scalar::from_value(depth as i32),
            op::second(),
            op::nonzero(),
        )?;
        exec_v_assign_masked(&visited, &next, &one, op::second(), op::nonzero())?;

        frontier = next;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bfs_two_level_fan() {
        // 0 -> 1 -> 2, 0 -> 3
        let a = Matrix::<i32>::new(4, 4);
        a.build(&[0, 1, 0], &[1, 2, 3], &[1, 1, 1]).unwrap();

        let v = Vector::<i32>::new(4);
        bfs(&v, &a, 0, &Descriptor::default()).unwrap();

        assert_eq!(v.get_int(0).unwrap(), 0);
        assert_eq!(v.get_int(1).unwrap(), 1);
        assert_eq!(v.get_int(3).unwrap(), 1);
        assert_eq!(v.get_int(2).unwrap(), 2);
    }

    #[test]
    fn test_bfs_source_out_of_range() {
        let a = Matrix::<i32>::new(2, 2);
        let v = Vector::<i32>::new(2);
        assert!(bfs(&v, &a, 5, &Descriptor::default()).is_err());
    }
}
