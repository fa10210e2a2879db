//! Matrix container

use crate::block::{CooMat, MatrixFormat};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::op::OpBinaryRef;
use crate::storage::MatrixStorage;
use std::cell::{Ref, RefCell, RefMut};

/// Sparse matrix of logical shape `(n_rows, n_cols)`
///
/// Unstored cells equal the fill value (zero unless changed). Point
/// writes land in the LIL slot, point reads in the DOK slot, bulk
/// build/read in the COO slot; the storage manager materialises formats
/// on demand and keeps the valid set consistent.
pub struct Matrix<T: Element> {
    n_rows: u32,
    n_cols: u32,
    storage: RefCell<MatrixStorage<T>>,
}

impl<T: Element> Matrix<T> {
    /// Create an empty matrix
    pub fn new(n_rows: u32, n_cols: u32) -> Self {
        Self {
            n_rows,
            n_cols,
            storage: RefCell::new(MatrixStorage::new(n_rows, n_cols)),
        }
    }

    /// Number of rows
    #[inline]
    pub fn n_rows(&self) -> u32 {
        self.n_rows
    }

    /// Number of columns
    #[inline]
    pub fn n_cols(&self) -> u32 {
        self.n_cols
    }

    /// Element type of the container
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub(crate) fn storage(&self) -> Result<Ref<'_, MatrixStorage<T>>> {
        self.storage
            .try_borrow()
            .map_err(|_| Error::invalid_state("matrix storage is being mutated re-entrantly"))
    }

    pub(crate) fn storage_mut(&self) -> Result<RefMut<'_, MatrixStorage<T>>> {
        self.storage
            .try_borrow_mut()
            .map_err(|_| Error::invalid_state("matrix storage is already borrowed"))
    }

    fn check_coords(&self, row_id: u32, col_id: u32) -> Result<()> {
        if row_id >= self.n_rows {
            return Err(Error::IndexOutOfBounds {
                index: row_id,
                size: self.n_rows,
            });
        }
        if col_id >= self.n_cols {
            return Err(Error::IndexOutOfBounds {
                index: col_id,
                size: self.n_cols,
            });
        }
        Ok(())
    }

    fn set_element(&self, row_id: u32, col_id: u32, value: T) -> Result<()> {
        self.check_coords(row_id, col_id)?;
        let mut st = self.storage_mut()?;
        st.validate_rwd(MatrixFormat::Lil)?;
        st.lil_mut()?.add_element(row_id, col_id, value);
        Ok(())
    }

    fn get_element(&self, row_id: u32, col_id: u32) -> Result<T> {
        self.check_coords(row_id, col_id)?;
        let mut st = self.storage_mut()?;
        st.validate_rw(MatrixFormat::Dok)?;
        let fill = st.fill_value();
        Ok(st.dok()?.get(row_id, col_id).unwrap_or(fill))
    }

    /// Write an i32 value at `(row_id, col_id)`, cast to the element type
    pub fn set_int(&self, row_id: u32, col_id: u32, value: i32) -> Result<()> {
        self.set_element(row_id, col_id, T::from_f64(value as f64))
    }

    /// Write a u32 value at `(row_id, col_id)`, cast to the element type
    pub fn set_uint(&self, row_id: u32, col_id: u32, value: u32) -> Result<()> {
        self.set_element(row_id, col_id, T::from_f64(value as f64))
    }

    /// Write an f32 value at `(row_id, col_id)`, cast to the element type
    pub fn set_float(&self, row_id: u32, col_id: u32, value: f32) -> Result<()> {
        self.set_element(row_id, col_id, T::from_f64(value as f64))
    }

    /// Read the cell at `(row_id, col_id)` as i32
    pub fn get_int(&self, row_id: u32, col_id: u32) -> Result<i32> {
        Ok(self.get_element(row_id, col_id)?.to_f64() as i32)
    }

    /// Read the cell at `(row_id, col_id)` as u32
    pub fn get_uint(&self, row_id: u32, col_id: u32) -> Result<u32> {
        Ok(self.get_element(row_id, col_id)?.to_f64() as u32)
    }

    /// Read the cell at `(row_id, col_id)` as f32
    pub fn get_float(&self, row_id: u32, col_id: u32) -> Result<f32> {
        Ok(self.get_element(row_id, col_id)?.to_f64() as f32)
    }

    /// Bulk-populate from coordinate triplets, replacing prior content
    ///
    /// The three slices must have equal length; coordinates must be in
    /// range. Duplicate coordinates are merged with the registered
    /// reduce operator.
    pub fn build(&self, row_keys: &[u32], col_keys: &[u32], values: &[T]) -> Result<()> {
        crate::dispatch::dispatch(&crate::dispatch::Task::MBuild {
            r: self,
            rows: row_keys,
            cols: col_keys,
            values,
        })
    }

    /// Read the stored triplets as views into the COO slot
    pub fn read(&self) -> Result<MatrixCooView<'_, T>> {
        self.storage_mut()?.validate_rw(MatrixFormat::Coo)?;
        let guard = self.storage()?;
        Ref::filter_map(guard, |st| st.coo().ok())
            .map(MatrixCooView)
            .map_err(|_| Error::invalid_state("coo block not materialised"))
    }

    /// Number of stored entries
    pub fn nvals(&self) -> Result<usize> {
        Ok(self.storage()?.nvals())
    }

    /// Hint the engine to materialise `format` now
    pub fn set_format(&self, format: MatrixFormat) -> Result<()> {
        self.storage_mut()?.validate_rw(format)
    }

    /// Set the implicit value of unstored cells; empties the container
    pub fn set_fill_value(&self, value: T) -> Result<()> {
        self.storage_mut()?.set_fill_value(value);
        Ok(())
    }

    /// The implicit value of unstored cells
    pub fn fill_value(&self) -> Result<T> {
        Ok(self.storage()?.fill_value())
    }

    /// Register the operator that merges duplicate coordinates; the
    /// default keeps the last written value
    pub fn set_reduce(&self, reduce: OpBinaryRef<T>) -> Result<()> {
        self.storage_mut()?.set_reduce(reduce);
        Ok(())
    }

    /// Forget all content without releasing buffers
    pub fn clear(&self) -> Result<()> {
        self.storage_mut()?.invalidate();
        Ok(())
    }

    /// True if `format` currently holds the content
    pub fn is_valid(&self, format: MatrixFormat) -> Result<bool> {
        Ok(self.storage()?.is_valid(format))
    }
}

/// Borrowed view of a matrix's COO triplets
pub struct MatrixCooView<'a, T: Element>(Ref<'a, CooMat<T>>);

impl<T: Element> MatrixCooView<'_, T> {
    /// Row index per stored entry
    pub fn row_indices(&self) -> &[u32] {
        &self.0.ai
    }

    /// Column index per stored entry
    pub fn col_indices(&self) -> &[u32] {
        &self.0.aj
    }

    /// Value per stored entry
    pub fn values(&self) -> &[T] {
        &self.0.ax
    }

    /// Number of stored entries
    pub fn nvals(&self) -> usize {
        self.0.nvals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_round_trip() {
        let m = Matrix::<f32>::new(3, 3);
        m.set_float(0, 1, 2.5).unwrap();
        m.set_float(2, 2, -1.0).unwrap();

        assert_eq!(m.get_float(0, 1).unwrap(), 2.5);
        assert_eq!(m.get_float(2, 2).unwrap(), -1.0);
        // never written: fill value
        assert_eq!(m.get_float(1, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_mixed_type_access() {
        let m = Matrix::<f32>::new(2, 2);
        m.set_int(0, 0, 7).unwrap();
        assert_eq!(m.get_float(0, 0).unwrap(), 7.0);
        assert_eq!(m.get_uint(0, 0).unwrap(), 7);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let m = Matrix::<i32>::new(2, 2);
        assert!(m.set_int(2, 0, 1).is_err());
        assert!(m.set_int(0, 5, 1).is_err());
        assert!(m.get_int(9, 0).is_err());
    }

    #[test]
    fn test_fill_value_respected_after_change() {
        let m = Matrix::<i32>::new(2, 2);
        m.set_fill_value(-7).unwrap();
        assert_eq!(m.get_int(0, 0).unwrap(), -7);
    }

    #[test]
    fn test_clear() {
        let m = Matrix::<i32>::new(2, 2);
        m.set_int(0, 0, 3).unwrap();
        m.clear().unwrap();
        assert_eq!(m.nvals().unwrap(), 0);
        assert_eq!(m.get_int(0, 0).unwrap(), 0);
    }
}
