//! List-of-lists (LIL) matrix block

use crate::dtype::Element;

/// LIL matrix block: one ordered `(col, val)` list per row
///
/// Point writes append in column order without resolving duplicates;
/// equal columns sit adjacent and are merged by the container's reduce
/// operator when the block is converted to COO.
#[derive(Debug, Clone)]
pub struct LilMat<T: Element> {
    /// Per-row entry lists, each ordered by column
    pub rows: Vec<Vec<(u32, T)>>,
}

impl<T: Element> LilMat<T> {
    /// Create an empty block for `n_rows` rows
    pub fn new(n_rows: u32) -> Self {
        Self {
            rows: vec![Vec::new(); n_rows as usize],
        }
    }

    /// Number of stored entries, duplicates included
    pub fn nvals(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Append a value at `(i, j)`, keeping the row ordered by column.
    ///
    /// A duplicate column is inserted after the existing run so reduce
    /// order matches write order.
    pub fn add_element(&mut self, i: u32, j: u32, x: T) {
        let row = &mut self.rows[i as usize];
        let pos = row.partition_point(|&(c, _)| c <= j);
        row.insert(pos, (j, x));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_column_order() {
        let mut lil = LilMat::<i32>::new(2);
        lil.add_element(0, 5, 50);
        lil.add_element(0, 1, 10);
        lil.add_element(0, 3, 30);
        assert_eq!(lil.rows[0], vec![(1, 10), (3, 30), (5, 50)]);
        assert!(lil.rows[1].is_empty());
    }

    #[test]
    fn test_duplicates_keep_write_order() {
        let mut lil = LilMat::<i32>::new(1);
        lil.add_element(0, 2, 1);
        lil.add_element(0, 2, 7);
        assert_eq!(lil.rows[0], vec![(2, 1), (2, 7)]);
        assert_eq!(lil.nvals(), 2);
    }
}
