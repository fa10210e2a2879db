//! Coordinate (COO) blocks for matrices and vectors

use crate::dtype::Element;

/// COO matrix block: parallel `(Ai, Aj, Ax)` arrays
///
/// Canonical form is row-major sorted by `(row, col)` with no duplicate
/// coordinates; conversions out of LIL/DOK and the bulk build path
/// establish that form.
#[derive(Debug, Clone)]
pub struct CooMat<T: Element> {
    /// Row index per stored entry
    pub ai: Vec<u32>,
    /// Column index per stored entry
    pub aj: Vec<u32>,
    /// Value per stored entry
    pub ax: Vec<T>,
}

impl<T: Element> CooMat<T> {
    /// Create an empty block
    pub fn new() -> Self {
        Self {
            ai: Vec::new(),
            aj: Vec::new(),
            ax: Vec::new(),
        }
    }

    /// Number of stored entries
    #[inline]
    pub fn nvals(&self) -> usize {
        self.ax.len()
    }

    /// True if the two blocks store the same coordinate pattern
    pub fn same_structure(&self, other: &Self) -> bool {
        self.ai == other.ai && self.aj == other.aj
    }

    /// Sort entries by `(row, col)` and merge duplicate coordinates with
    /// `reduce`, establishing the canonical form
    pub fn canonicalize(&mut self, reduce: impl Fn(T, T) -> T) {
        let n = self.nvals();
        if n <= 1 {
            return;
        }

        let mut perm: Vec<usize> = (0..n).collect();
        perm.sort_by(|&a, &b| {
            (self.ai[a], self.aj[a]).cmp(&(self.ai[b], self.aj[b]))
        });

        let mut ai = Vec::with_capacity(n);
        let mut aj = Vec::with_capacity(n);
        let mut ax: Vec<T> = Vec::with_capacity(n);

        for &k in &perm {
            let (i, j, x) = (self.ai[k], self.aj[k], self.ax[k]);
            if let (Some(&pi), Some(&pj)) = (ai.last(), aj.last()) {
                if pi == i && pj == j {
                    let last = ax.last_mut().expect("values track keys");
                    *last = reduce(*last, x);
                    continue;
                }
            }
            ai.push(i);
            aj.push(j);
            ax.push(x);
        }

        self.ai = ai;
        self.aj = aj;
        self.ax = ax;
    }
}

impl<T: Element> Default for CooMat<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// COO vector block: parallel `(Ai, Ax)` arrays, ascending and
/// duplicate-free
#[derive(Debug, Clone)]
pub struct CooVec<T: Element> {
    /// Index per stored entry, ascending
    pub ai: Vec<u32>,
    /// Value per stored entry
    pub ax: Vec<T>,
}

impl<T: Element> CooVec<T> {
    /// Create an empty block
    pub fn new() -> Self {
        Self {
            ai: Vec::new(),
            ax: Vec::new(),
        }
    }

    /// Number of stored entries
    #[inline]
    pub fn nvals(&self) -> usize {
        self.ax.len()
    }

    /// True if the two blocks store the same index pattern
    pub fn same_structure(&self, other: &Self) -> bool {
        self.ai == other.ai
    }

    /// Insert or combine a value at `i`, keeping indices sorted.
    ///
    /// An existing entry at `i` is merged with `reduce(old, new)`.
    pub fn insert(&mut self, i: u32, x: T, reduce: impl Fn(T, T) -> T) {
        match self.ai.binary_search(&i) {
            Ok(pos) => self.ax[pos] = reduce(self.ax[pos], x),
            Err(pos) => {
                self.ai.insert(pos, i);
                self.ax.insert(pos, x);
            }
        }
    }

    /// Sort entries by index and merge duplicates with `reduce`,
    /// establishing the canonical form
    pub fn canonicalize(&mut self, reduce: impl Fn(T, T) -> T) {
        let n = self.nvals();
        if n <= 1 {
            return;
        }

        let mut perm: Vec<usize> = (0..n).collect();
        perm.sort_by_key(|&k| self.ai[k]);

        let mut ai = Vec::with_capacity(n);
        let mut ax: Vec<T> = Vec::with_capacity(n);
        for &k in &perm {
            let (i, x) = (self.ai[k], self.ax[k]);
            if ai.last() == Some(&i) {
                let last = ax.last_mut().expect("values track keys");
                *last = reduce(*last, x);
            } else {
                ai.push(i);
                ax.push(x);
            }
        }

        self.ai = ai;
        self.ax = ax;
    }
}

impl<T: Element> Default for CooVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_sorts_and_merges() {
        let mut coo = CooMat::<i32> {
            ai: vec![2, 0, 0, 2],
            aj: vec![1, 3, 3, 1],
            ax: vec![10, 1, 2, 5],
        };
        coo.canonicalize(|a, b| a + b);

        assert_eq!(coo.ai, vec![0, 2]);
        assert_eq!(coo.aj, vec![3, 1]);
        assert_eq!(coo.ax, vec![3, 15]);
    }

    #[test]
    fn test_canonicalize_empty() {
        let mut coo = CooMat::<f32>::new();
        coo.canonicalize(|_, b| b);
        assert_eq!(coo.nvals(), 0);
    }

    #[test]
    fn test_vec_insert_sorted() {
        let mut v = CooVec::<i32>::new();
        v.insert(5, 50, |_, b| b);
        v.insert(1, 10, |_, b| b);
        v.insert(3, 30, |_, b| b);
        assert_eq!(v.ai, vec![1, 3, 5]);
        assert_eq!(v.ax, vec![10, 30, 50]);
    }

    #[test]
    fn test_vec_insert_duplicate_reduces() {
        let mut v = CooVec::<i32>::new();
        v.insert(2, 7, |a, b| a + b);
        v.insert(2, 3, |a, b| a + b);
        assert_eq!(v.ai, vec![2]);
        assert_eq!(v.ax, vec![10]);
    }
}
