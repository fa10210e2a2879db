//! Multi-format storage managers
//!
//! Each container owns a storage value: an ordered set of format slots
//! with a validity bitmask, the logical dimensions, the fill value, and
//! the duplicate-resolution operator. The manager materialises formats
//! lazily: a read in a non-valid format triggers conversion along the
//! shortest path from a currently-valid slot; a mutation invalidates
//! every other slot.
//!
//! # Validation contract
//!
//! - `validate_rw(fmt)`: ensure `fmt` is valid, converting if needed.
//!   On an empty container a fresh default block is constructed instead.
//! - `validate_rwd(fmt)`: `validate_rw`, then invalidate every other
//!   slot (the caller will mutate the block).
//! - `validate_wd(fmt)`: install a fresh default block and mark only
//!   `fmt` valid (the caller fully overwrites it).
//! - `invalidate()`: clear every validity flag; buffers stay allocated.
//!
//! After any successful call the valid slots are pairwise equivalent
//! under the conversion semantics.

mod matrix;
mod vector;

pub use matrix::MatrixStorage;
pub use vector::VectorStorage;

use smallvec::SmallVec;
use std::collections::VecDeque;

/// Multi-source BFS over the conversion graph.
///
/// Returns the shortest chain `source → … → target` starting at any
/// format for which `is_valid` holds, or `None` when the target is
/// unreachable. The chain includes both endpoints.
pub(crate) fn shortest_conversion_path<F>(
    all: &'static [F],
    index: fn(F) -> usize,
    edges: fn(F) -> &'static [F],
    is_valid: impl Fn(F) -> bool,
    target: F,
) -> Option<SmallVec<[F; 4]>>
where
    F: Copy + PartialEq,
{
    let mut prev: Vec<Option<F>> = vec![None; all.len()];
    let mut seen: Vec<bool> = vec![false; all.len()];
    let mut queue = VecDeque::new();

    for &f in all {
        if is_valid(f) {
            seen[index(f)] = true;
            queue.push_back(f);
        }
    }

    while let Some(f) = queue.pop_front() {
        if f == target {
            let mut path: SmallVec<[F; 4]> = SmallVec::new();
            let mut cur = f;
            path.push(cur);
            while let Some(p) = prev[index(cur)] {
                path.push(p);
                cur = p;
            }
            path.reverse();
            return Some(path);
        }
        for &next in edges(f) {
            if !seen[index(next)] {
                seen[index(next)] = true;
                prev[index(next)] = Some(f);
                queue.push_back(next);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MatrixFormat;

    #[test]
    fn test_shortest_path_direct() {
        let path = shortest_conversion_path(
            MatrixFormat::all(),
            MatrixFormat::index,
            matrix::conversion_edges,
            |f| f == MatrixFormat::Coo,
            MatrixFormat::Csr,
        )
        .unwrap();
        assert_eq!(&path[..], &[MatrixFormat::Coo, MatrixFormat::Csr]);
    }

    #[test]
    fn test_shortest_path_two_hops() {
        let path = shortest_conversion_path(
            MatrixFormat::all(),
            MatrixFormat::index,
            matrix::conversion_edges,
            |f| f == MatrixFormat::Lil,
            MatrixFormat::Csr,
        )
        .unwrap();
        assert_eq!(
            &path[..],
            &[MatrixFormat::Lil, MatrixFormat::Coo, MatrixFormat::Csr]
        );
    }

    #[test]
    fn test_shortest_path_prefers_nearest_source() {
        // With both LIL and COO valid, COO is the one-hop source.
        let path = shortest_conversion_path(
            MatrixFormat::all(),
            MatrixFormat::index,
            matrix::conversion_edges,
            |f| f == MatrixFormat::Lil || f == MatrixFormat::Coo,
            MatrixFormat::Csr,
        )
        .unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0], MatrixFormat::Coo);
    }

    #[test]
    fn test_no_path_when_nothing_valid() {
        let path = shortest_conversion_path(
            MatrixFormat::all(),
            MatrixFormat::index,
            matrix::conversion_edges,
            |_| false,
            MatrixFormat::Csr,
        );
        assert!(path.is_none());
    }
}
