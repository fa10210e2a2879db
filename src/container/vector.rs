//! Vector container

use crate::block::{CooVec, VectorFormat};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::op::OpBinaryRef;
use crate::storage::VectorStorage;
use std::cell::{Ref, RefCell, RefMut};

/// Sparse vector of logical length `n_rows`
///
/// Unstored indices equal the fill value. Point writes land in the COO
/// slot (sorted insert, duplicates merged with the reduce operator);
/// point reads in the dense slot.
pub struct Vector<T: Element> {
    n_rows: u32,
    storage: RefCell<VectorStorage<T>>,
}

impl<T: Element> Vector<T> {
    /// Create an empty vector
    pub fn new(n_rows: u32) -> Self {
        Self {
            n_rows,
            storage: RefCell::new(VectorStorage::new(n_rows)),
        }
    }

    /// Vector length
    #[inline]
    pub fn n_rows(&self) -> u32 {
        self.n_rows
    }

    /// Element type of the container
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub(crate) fn storage(&self) -> Result<Ref<'_, VectorStorage<T>>> {
        self.storage
            .try_borrow()
            .map_err(|_| Error::invalid_state("vector storage is being mutated re-entrantly"))
    }

    pub(crate) fn storage_mut(&self) -> Result<RefMut<'_, VectorStorage<T>>> {
        self.storage
            .try_borrow_mut()
            .map_err(|_| Error::invalid_state("vector storage is already borrowed"))
    }

    fn check_coord(&self, row_id: u32) -> Result<()> {
        if row_id >= self.n_rows {
            return Err(Error::IndexOutOfBounds {
                index: row_id,
                size: self.n_rows,
            });
        }
        Ok(())
    }

    fn set_element(&self, row_id: u32, value: T) -> Result<()> {
        self.check_coord(row_id)?;
        let mut st = self.storage_mut()?;
        st.validate_rwd(VectorFormat::Coo)?;
        let reduce = st.reduce().clone();
        st.coo_mut()?
            .insert(row_id, value, |a, b| reduce.apply(a, b));
        Ok(())
    }

    fn get_element(&self, row_id: u32) -> Result<T> {
        self.check_coord(row_id)?;
        let mut st = self.storage_mut()?;
        st.validate_rw(VectorFormat::Dense)?;
        Ok(st.dense()?.ax[row_id as usize])
    }

    /// Write an i32 value at `row_id`, cast to the element type
    pub fn set_int(&self, row_id: u32, value: i32) -> Result<()> {
        self.set_element(row_id, T::from_f64(value as f64))
    }

    /// Write a u32 value at `row_id`, cast to the element type
    pub fn set_uint(&self, row_id: u32, value: u32) -> Result<()> {
        self.set_element(row_id, T::from_f64(value as f64))
    }

    /// Write an f32 value at `row_id`, cast to the element type
    pub fn set_float(&self, row_id: u32, value: f32) -> Result<()> {
        self.set_element(row_id, T::from_f64(value as f64))
    }

    /// Read the entry at `row_id` as i32
    pub fn get_int(&self, row_id: u32) -> Result<i32> {
        Ok(self.get_element(row_id)?.to_f64() as i32)
    }

    /// Read the entry at `row_id` as u32
    pub fn get_uint(&self, row_id: u32) -> Result<u32> {
        Ok(self.get_element(row_id)?.to_f64() as u32)
    }

    /// Read the entry at `row_id` as f32
    pub fn get_float(&self, row_id: u32) -> Result<f32> {
        Ok(self.get_element(row_id)?.to_f64() as f32)
    }

    /// Bulk-populate from `(index, value)` pairs, replacing prior content
    pub fn build(&self, keys: &[u32], values: &[T]) -> Result<()> {
        if keys.len() != values.len() {
            return Err(Error::invalid_argument(
                "keys",
                format!("{} keys for {} values", keys.len(), values.len()),
            ));
        }
        if let Some(&bad) = keys.iter().find(|&&i| i >= self.n_rows) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: self.n_rows,
            });
        }
        let mut st = self.storage_mut()?;
        st.validate_wd(VectorFormat::Coo)?;
        let reduce = st.reduce().clone();
        let coo = st.coo_mut()?;
        coo.ai = keys.to_vec();
        coo.ax = values.to_vec();
        coo.canonicalize(|a, b| reduce.apply(a, b));
        Ok(())
    }

    /// Read the stored pairs as views into the COO slot
    pub fn read(&self) -> Result<VectorCooView<'_, T>> {
        self.storage_mut()?.validate_rw(VectorFormat::Coo)?;
        let guard = self.storage()?;
        Ref::filter_map(guard, |st| st.coo().ok())
            .map(VectorCooView)
            .map_err(|_| Error::invalid_state("coo block not materialised"))
    }

    /// Number of stored (non-fill) entries
    pub fn nvals(&self) -> Result<usize> {
        Ok(self.storage()?.nvals())
    }

    /// Hint the engine to materialise `format` now
    pub fn set_format(&self, format: VectorFormat) -> Result<()> {
        self.storage_mut()?.validate_rw(format)
    }

    /// Set the implicit value of unstored indices; empties the container
    pub fn set_fill_value(&self, value: T) -> Result<()> {
        self.storage_mut()?.set_fill_value(value);
        Ok(())
    }

    /// The implicit value of unstored indices
    pub fn fill_value(&self) -> Result<T> {
        Ok(self.storage()?.fill_value())
    }

    /// Register the operator that merges duplicate indices
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
    pub fn is_valid(&self, format: VectorFormat) -> Result<bool> {
        Ok(self.storage()?.is_valid(format))
    }
}

/// Borrowed view of a vector's COO pairs
pub struct VectorCooView<'a, T: Element>(Ref<'a, CooVec<T>>);

impl<T: Element> VectorCooView<'_, T> {
    /// Index per stored entry
    pub fn indices(&self) -> &[u32] {
        &self.0.ai
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
    use crate::op;

    #[test]
    fn test_set_get_round_trip() {
        let v = Vector::<i32>::new(5);
        v.set_int(3, 30).unwrap();
        v.set_int(1, 10).unwrap();
        assert_eq!(v.get_int(3).unwrap(), 30);
        assert_eq!(v.get_int(1).unwrap(), 10);
        assert_eq!(v.get_int(0).unwrap(), 0);
    }

    #[test]
    fn test_build_sorts_and_merges() {
        let v = Vector::<i32>::new(10);
        v.set_reduce(op::plus()).unwrap();
        v.build(&[7, 2, 7], &[1, 5, 3]).unwrap();

        let view = v.read().unwrap();
        assert_eq!(view.indices(), &[2, 7]);
        assert_eq!(view.values(), &[5, 4]);
    }

    #[test]
    fn test_build_length_mismatch() {
        let v = Vector::<i32>::new(4);
        assert!(matches!(
            v.build(&[0, 1], &[1]),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_build_out_of_range() {
        let v = Vector::<i32>::new(4);
        assert!(v.build(&[4], &[1]).is_err());
    }

    #[test]
    fn test_duplicate_set_last_wins_by_default() {
        let v = Vector::<i32>::new(4);
        v.set_int(2, 5).unwrap();
        v.set_int(2, 9).unwrap();
        assert_eq!(v.get_int(2).unwrap(), 9);
    }

    #[test]
    fn test_read_before_write_is_empty() {
        let v = Vector::<f32>::new(4);
        let view = v.read().unwrap();
        assert_eq!(view.nvals(), 0);
    }
}
