//! Compressed sparse row (CSR) matrix block

use crate::dtype::Element;

/// CSR matrix block: row pointers, column indices, values
///
/// `ap` has length `n_rows + 1`; row `i` occupies `ax[ap[i]..ap[i+1]]`
/// with columns ascending inside a row.
#[derive(Debug, Clone)]
pub struct CsrMat<T: Element> {
    /// Row pointer array, length `n_rows + 1`
    pub ap: Vec<u32>,
    /// Column index per stored entry
    pub aj: Vec<u32>,
    /// Value per stored entry
    pub ax: Vec<T>,
}

impl<T: Element> CsrMat<T> {
    /// Create an empty block for `n_rows` rows
    pub fn new(n_rows: u32) -> Self {
        Self {
            ap: vec![0; n_rows as usize + 1],
            aj: Vec::new(),
            ax: Vec::new(),
        }
    }

    /// Number of stored entries
    #[inline]
    pub fn nvals(&self) -> usize {
        self.ax.len()
    }

    /// Number of rows described by the pointer array
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.ap.len().saturating_sub(1)
    }

    /// Half-open entry range of row `i`
    #[inline]
    pub fn row_range(&self, i: u32) -> std::ops::Range<usize> {
        self.ap[i as usize] as usize..self.ap[i as usize + 1] as usize
    }

    /// True if the two blocks store the same coordinate pattern
    pub fn same_structure(&self, other: &Self) -> bool {
        self.ap == other.ap && self.aj == other.aj
    }
}
