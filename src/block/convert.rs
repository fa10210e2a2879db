//! Conversion edges between block formats
//!
//! Every conversion is total, pure, and value-preserving; empty inputs
//! yield empty outputs. The storage manager chains these edges along the
//! shortest path between a valid slot and the requested format.

use super::{CooMat, CooVec, CsrMat, DenseVec, DokMat, LilMat};
use crate::dtype::Element;

/// COO → CSR: stable count-sort on row, then prefix-sum to build `Ap`.
///
/// Per-row column order of the input is preserved, so a canonical
/// (row-major sorted) COO yields a canonical CSR.
pub fn coo_to_csr<T: Element>(n_rows: u32, coo: &CooMat<T>) -> CsrMat<T> {
    let n_rows = n_rows as usize;
    let nnz = coo.nvals();

    let mut ap = vec![0u32; n_rows + 1];
    for &i in &coo.ai {
        ap[i as usize + 1] += 1;
    }
    for i in 1..=n_rows {
        ap[i] += ap[i - 1];
    }

    let mut aj = vec![0u32; nnz];
    let mut ax = vec![T::zero(); nnz];
    let mut next = ap.clone();
    for k in 0..nnz {
        let slot = next[coo.ai[k] as usize] as usize;
        aj[slot] = coo.aj[k];
        ax[slot] = coo.ax[k];
        next[coo.ai[k] as usize] += 1;
    }

    CsrMat { ap, aj, ax }
}

/// CSR → COO: expand `Ap` into `Ai` by segmented fill
pub fn csr_to_coo<T: Element>(csr: &CsrMat<T>) -> CooMat<T> {
    let mut ai = Vec::with_capacity(csr.nvals());
    for i in 0..csr.n_rows() {
        let count = (csr.ap[i + 1] - csr.ap[i]) as usize;
        ai.extend(std::iter::repeat(i as u32).take(count));
    }
    CooMat {
        ai,
        aj: csr.aj.clone(),
        ax: csr.ax.clone(),
    }
}

/// LIL → COO: concatenate ordered rows, merging duplicate columns with
/// `reduce` in write order
pub fn lil_to_coo<T: Element>(lil: &LilMat<T>, reduce: impl Fn(T, T) -> T) -> CooMat<T> {
    let mut coo = CooMat::new();
    for (i, row) in lil.rows.iter().enumerate() {
        for &(j, x) in row {
            if let (Some(&pi), Some(&pj)) = (coo.ai.last(), coo.aj.last()) {
                if pi == i as u32 && pj == j {
                    let last = coo.ax.last_mut().expect("values track keys");
                    *last = reduce(*last, x);
                    continue;
                }
            }
            coo.ai.push(i as u32);
            coo.aj.push(j);
            coo.ax.push(x);
        }
    }
    coo
}

/// DOK → COO: flatten the map and sort by `(row, col)`
pub fn dok_to_coo<T: Element>(dok: &DokMat<T>) -> CooMat<T> {
    let mut entries: Vec<((u32, u32), T)> = dok.ax.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort_by_key(|&(k, _)| k);

    let mut coo = CooMat::new();
    for ((i, j), x) in entries {
        coo.ai.push(i);
        coo.aj.push(j);
        coo.ax.push(x);
    }
    coo
}

/// COO → LIL: scatter entries into per-row lists
///
/// A canonical COO arrives row-major sorted, so each row list comes out
/// ordered by column without further sorting.
pub fn coo_to_lil<T: Element>(n_rows: u32, coo: &CooMat<T>) -> LilMat<T> {
    let mut lil = LilMat::new(n_rows);
    for k in 0..coo.nvals() {
        lil.rows[coo.ai[k] as usize].push((coo.aj[k], coo.ax[k]));
    }
    lil
}

/// COO → DOK: scatter entries into the map
pub fn coo_to_dok<T: Element>(coo: &CooMat<T>) -> DokMat<T> {
    let mut dok = DokMat::new();
    for k in 0..coo.nvals() {
        dok.ax.insert((coo.ai[k], coo.aj[k]), coo.ax[k]);
    }
    dok
}

/// Dense vector → COO vector: emit `(i, v)` for entries not equal to
/// `fill`
pub fn dense_to_coo_vec<T: Element>(dense: &DenseVec<T>, fill: T) -> CooVec<T> {
    let mut coo = CooVec::new();
    for (i, &x) in dense.ax.iter().enumerate() {
        if x != fill {
            coo.ai.push(i as u32);
            coo.ax.push(x);
        }
    }
    coo
}

/// COO vector → dense vector: scatter onto a fill-initialised buffer
pub fn coo_to_dense_vec<T: Element>(n_rows: u32, coo: &CooVec<T>, fill: T) -> DenseVec<T> {
    let mut dense = DenseVec::new(n_rows, fill);
    for k in 0..coo.nvals() {
        dense.ax[coo.ai[k] as usize] = coo.ax[k];
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_coo() -> CooMat<f32> {
        // [1, 0, 2]
        // [0, 0, 3]
        // [4, 5, 0]
        CooMat {
            ai: vec![0, 0, 1, 2, 2],
            aj: vec![0, 2, 2, 0, 1],
            ax: vec![1.0, 2.0, 3.0, 4.0, 5.0],
        }
    }

    #[test]
    fn test_coo_to_csr() {
        let csr = coo_to_csr(3, &sample_coo());
        assert_eq!(csr.ap, vec![0, 2, 3, 5]);
        assert_eq!(csr.aj, vec![0, 2, 2, 0, 1]);
        assert_eq!(csr.ax, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_coo_to_csr_empty() {
        let csr = coo_to_csr(3, &CooMat::<f32>::new());
        assert_eq!(csr.ap, vec![0, 0, 0, 0]);
        assert_eq!(csr.nvals(), 0);
    }

    #[test]
    fn test_csr_round_trip() {
        let coo = sample_coo();
        let back = csr_to_coo(&coo_to_csr(3, &coo));
        assert_eq!(back.ai, coo.ai);
        assert_eq!(back.aj, coo.aj);
        assert_eq!(back.ax, coo.ax);
    }

    #[test]
    fn test_lil_to_coo_merges_duplicates() {
        let mut lil = LilMat::<i32>::new(2);
        lil.add_element(0, 1, 3);
        lil.add_element(1, 0, 5);
        lil.add_element(0, 1, 4);

        // last write wins
        let coo = lil_to_coo(&lil, |_, b| b);
        assert_eq!(coo.ai, vec![0, 1]);
        assert_eq!(coo.aj, vec![1, 0]);
        assert_eq!(coo.ax, vec![4, 5]);

        let coo = lil_to_coo(&lil, |a, b| a + b);
        assert_eq!(coo.ax, vec![7, 5]);
    }

    #[test]
    fn test_dok_to_coo_sorted() {
        let mut dok = DokMat::<i32>::new();
        dok.insert(2, 0, 9, |_, b| b);
        dok.insert(0, 1, 1, |_, b| b);
        dok.insert(0, 0, 4, |_, b| b);

        let coo = dok_to_coo(&dok);
        assert_eq!(coo.ai, vec![0, 0, 2]);
        assert_eq!(coo.aj, vec![0, 1, 0]);
        assert_eq!(coo.ax, vec![4, 1, 9]);
    }

    #[test]
    fn test_coo_lil_round_trip() {
        let coo = sample_coo();
        let back = lil_to_coo(&coo_to_lil(3, &coo), |_, b| b);
        assert!(back.same_structure(&coo));
        assert_eq!(back.ax, coo.ax);
    }

    #[test]
    fn test_coo_dok_round_trip() {
        let coo = sample_coo();
        let back = dok_to_coo(&coo_to_dok(&coo));
        assert!(back.same_structure(&coo));
        assert_eq!(back.ax, coo.ax);
    }

    #[test]
    fn test_dense_coo_vec_round_trip() {
        let mut dense = DenseVec::<f32>::new(6, 0.0);
        dense.ax[1] = 2.5;
        dense.ax[4] = -1.0;

        let coo = dense_to_coo_vec(&dense, 0.0);
        assert_eq!(coo.ai, vec![1, 4]);
        assert_eq!(coo.ax, vec![2.5, -1.0]);

        let back = coo_to_dense_vec(6, &coo, 0.0);
        assert_eq!(back.ax, dense.ax);
    }

    #[test]
    fn test_dense_to_coo_respects_fill() {
        let dense = DenseVec::<f32>::new(4, f32::INFINITY);
        let coo = dense_to_coo_vec(&dense, f32::INFINITY);
        assert_eq!(coo.nvals(), 0);
    }
}
