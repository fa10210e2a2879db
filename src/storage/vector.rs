//! Storage manager for vectors

use crate::block::{convert, CooVec, DenseVec, VectorBlock, VectorFormat};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::op::{self, OpBinaryRef};

/// Conversion adjacency for vector formats
pub(crate) fn conversion_edges(f: VectorFormat) -> &'static [VectorFormat] {
    match f {
        #[cfg(feature = "wgpu")]
        VectorFormat::Coo => &[VectorFormat::Dense, VectorFormat::AccCoo],
        #[cfg(not(feature = "wgpu"))]
        VectorFormat::Coo => &[VectorFormat::Dense],
        #[cfg(feature = "wgpu")]
        VectorFormat::Dense => &[VectorFormat::Coo, VectorFormat::AccDense],
        #[cfg(not(feature = "wgpu"))]
        VectorFormat::Dense => &[VectorFormat::Coo],
        #[cfg(feature = "wgpu")]
        VectorFormat::AccCoo => &[VectorFormat::Coo],
        #[cfg(feature = "wgpu")]
        VectorFormat::AccDense => &[VectorFormat::Dense],
    }
}

/// Format slots, validity bits, and logical metadata of one vector
pub struct VectorStorage<T: Element> {
    n_rows: u32,
    fill_value: T,
    reduce: OpBinaryRef<T>,
    slots: Vec<Option<VectorBlock<T>>>,
    valid: u8,
}

impl<T: Element> VectorStorage<T> {
    /// Create an empty storage (no valid slot) of the given length
    pub fn new(n_rows: u32) -> Self {
        let mut slots = Vec::with_capacity(VectorFormat::COUNT);
        slots.resize_with(VectorFormat::COUNT, || None);
        Self {
            n_rows,
            fill_value: T::zero(),
            reduce: op::second(),
            slots,
            valid: 0,
        }
    }

    /// Vector length
    #[inline]
    pub fn n_rows(&self) -> u32 {
        self.n_rows
    }

    /// The value every unstored index is taken to equal
    #[inline]
    pub fn fill_value(&self) -> T {
        self.fill_value
    }

    /// Change the fill value; the container becomes logically empty
    pub fn set_fill_value(&mut self, value: T) {
        self.invalidate();
        self.fill_value = value;
    }

    /// The duplicate-resolution operator
    pub fn reduce(&self) -> &OpBinaryRef<T> {
        &self.reduce
    }

    /// Register the operator used to merge duplicate indices
    pub fn set_reduce(&mut self, reduce: OpBinaryRef<T>) {
        self.reduce = reduce;
    }

    /// True if `fmt` currently holds the container's content
    #[inline]
    pub fn is_valid(&self, fmt: VectorFormat) -> bool {
        self.valid & (1 << fmt.index()) != 0
    }

    /// True if any slot is valid
    #[inline]
    pub fn any_valid(&self) -> bool {
        self.valid != 0
    }

    /// Clear every validity flag without freeing buffers
    pub fn invalidate(&mut self) {
        self.valid = 0;
    }

    /// Number of conversions needed to make `fmt` valid
    pub fn conversion_cost(&self, fmt: VectorFormat) -> Option<u32> {
        if self.is_valid(fmt) {
            return Some(0);
        }
        if !self.any_valid() {
            return Some(1);
        }
        super::shortest_conversion_path(
            VectorFormat::all(),
            VectorFormat::index,
            conversion_edges,
            |f| self.is_valid(f),
            fmt,
        )
        .map(|path| path.len() as u32 - 1)
    }

    /// Ensure `fmt` is valid, converting from the nearest valid slot
    pub fn validate_rw(&mut self, fmt: VectorFormat) -> Result<()> {
        if self.is_valid(fmt) {
            return Ok(());
        }
        if !self.any_valid() {
            self.slots[fmt.index()] = Some(self.default_block(fmt)?);
            self.valid |= 1 << fmt.index();
            return Ok(());
        }
        let path = super::shortest_conversion_path(
            VectorFormat::all(),
            VectorFormat::index,
            conversion_edges,
            |f| self.is_valid(f),
            fmt,
        )
        .ok_or_else(|| {
            Error::invalid_state(format!("no conversion path to vector format {fmt}"))
        })?;
        for win in path.windows(2) {
            if !self.is_valid(win[1]) {
                self.convert_edge(win[0], win[1])?;
            }
        }
        Ok(())
    }

    /// `validate_rw`, then invalidate every other slot (caller mutates)
    pub fn validate_rwd(&mut self, fmt: VectorFormat) -> Result<()> {
        self.validate_rw(fmt)?;
        self.valid = 1 << fmt.index();
        Ok(())
    }

    /// Install a fresh default block for `fmt` and mark only it valid
    /// (caller fully overwrites)
    pub fn validate_wd(&mut self, fmt: VectorFormat) -> Result<()> {
        self.slots[fmt.index()] = Some(self.default_block(fmt)?);
        self.valid = 1 << fmt.index();
        Ok(())
    }

    /// Number of stored (non-fill) entries
    pub fn nvals(&self) -> usize {
        if self.is_valid(VectorFormat::Coo) {
            if let Some(VectorBlock::Coo(b)) = self.slots[VectorFormat::Coo.index()].as_ref() {
                return b.nvals();
            }
        }
        if self.is_valid(VectorFormat::Dense) {
            if let Some(VectorBlock::Dense(b)) = self.slots[VectorFormat::Dense.index()].as_ref() {
                return b.nvals(self.fill_value);
            }
        }
        0
    }

    fn default_block(&self, fmt: VectorFormat) -> Result<VectorBlock<T>> {
        Ok(match fmt {
            VectorFormat::Coo => VectorBlock::Coo(CooVec::new()),
            VectorFormat::Dense => {
                VectorBlock::Dense(DenseVec::new(self.n_rows, self.fill_value))
            }
            #[cfg(feature = "wgpu")]
            VectorFormat::AccCoo => VectorBlock::AccCoo(
                crate::backend::acc::block::AccCooVec::upload(&CooVec::new())?,
            ),
            #[cfg(feature = "wgpu")]
            VectorFormat::AccDense => VectorBlock::AccDense(
                crate::backend::acc::block::AccDenseVec::upload(&DenseVec::new(
                    self.n_rows,
                    self.fill_value,
                ))?,
            ),
        })
    }

    fn convert_edge(&mut self, from: VectorFormat, to: VectorFormat) -> Result<()> {
        let block = match (from, to) {
            (VectorFormat::Coo, VectorFormat::Dense) => VectorBlock::Dense(
                convert::coo_to_dense_vec(self.n_rows, self.coo()?, self.fill_value),
            ),
            (VectorFormat::Dense, VectorFormat::Coo) => {
                VectorBlock::Coo(convert::dense_to_coo_vec(self.dense()?, self.fill_value))
            }
            #[cfg(feature = "wgpu")]
            (VectorFormat::Coo, VectorFormat::AccCoo) => VectorBlock::AccCoo(
                crate::backend::acc::block::AccCooVec::upload(self.coo()?)?,
            ),
            #[cfg(feature = "wgpu")]
            (VectorFormat::AccCoo, VectorFormat::Coo) => {
                VectorBlock::Coo(self.acc_coo()?.download()?)
            }
            #[cfg(feature = "wgpu")]
            (VectorFormat::Dense, VectorFormat::AccDense) => VectorBlock::AccDense(
                crate::backend::acc::block::AccDenseVec::upload(self.dense()?)?,
            ),
            #[cfg(feature = "wgpu")]
            (VectorFormat::AccDense, VectorFormat::Dense) => {
                VectorBlock::Dense(self.acc_dense()?.download()?)
            }
            (from, to) => {
                return Err(Error::Internal(format!(
                    "no vector conversion edge {from} -> {to}"
                )))
            }
        };
        self.slots[to.index()] = Some(block);
        self.valid |= 1 << to.index();
        Ok(())
    }

    /// Valid COO block
    pub fn coo(&self) -> Result<&CooVec<T>> {
        match self.slots[VectorFormat::Coo.index()].as_ref() {
            Some(VectorBlock::Coo(b)) if self.is_valid(VectorFormat::Coo) => Ok(b),
            _ => Err(Error::invalid_state("coo block not materialised")),
        }
    }

    /// Valid COO block, mutable
    pub fn coo_mut(&mut self) -> Result<&mut CooVec<T>> {
        if !self.is_valid(VectorFormat::Coo) {
            return Err(Error::invalid_state("coo block not materialised"));
        }
        match self.slots[VectorFormat::Coo.index()].as_mut() {
            Some(VectorBlock::Coo(b)) => Ok(b),
            _ => Err(Error::invalid_state("coo block not materialised")),
        }
    }

    /// Valid dense block
    pub fn dense(&self) -> Result<&DenseVec<T>> {
        match self.slots[VectorFormat::Dense.index()].as_ref() {
            Some(VectorBlock::Dense(b)) if self.is_valid(VectorFormat::Dense) => Ok(b),
            _ => Err(Error::invalid_state("dense block not materialised")),
        }
    }

    /// Valid dense block, mutable
    pub fn dense_mut(&mut self) -> Result<&mut DenseVec<T>> {
        if !self.is_valid(VectorFormat::Dense) {
            return Err(Error::invalid_state("dense block not materialised"));
        }
        match self.slots[VectorFormat::Dense.index()].as_mut() {
            Some(VectorBlock::Dense(b)) => Ok(b),
            _ => Err(Error::invalid_state("dense block not materialised")),
        }
    }

    /// Valid device COO block
    #[cfg(feature = "wgpu")]
    pub fn acc_coo(&self) -> Result<&crate::backend::acc::block::AccCooVec<T>> {
        match self.slots[VectorFormat::AccCoo.index()].as_ref() {
            Some(VectorBlock::AccCoo(b)) if self.is_valid(VectorFormat::AccCoo) => Ok(b),
            _ => Err(Error::invalid_state("acc-coo block not materialised")),
        }
    }

    /// Valid device dense block
    #[cfg(feature = "wgpu")]
    pub fn acc_dense(&self) -> Result<&crate::backend::acc::block::AccDenseVec<T>> {
        match self.slots[VectorFormat::AccDense.index()].as_ref() {
            Some(VectorBlock::AccDense(b)) if self.is_valid(VectorFormat::AccDense) => Ok(b),
            _ => Err(Error::invalid_state("acc-dense block not materialised")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dense_is_fill_initialised() {
        let mut st = VectorStorage::<f32>::new(4);
        st.set_fill_value(f32::INFINITY);
        st.validate_rw(VectorFormat::Dense).unwrap();
        assert!(st.dense().unwrap().ax.iter().all(|x| x.is_infinite()));
    }

    #[test]
    fn test_coo_dense_round_trip() {
        let mut st = VectorStorage::<i32>::new(5);
        st.validate_wd(VectorFormat::Coo).unwrap();
        st.coo_mut().unwrap().insert(3, 30, |_, b| b);
        st.coo_mut().unwrap().insert(1, 10, |_, b| b);

        st.validate_rw(VectorFormat::Dense).unwrap();
        assert_eq!(st.dense().unwrap().ax, vec![0, 10, 0, 30, 0]);

        // drop the sparse slot, rebuild it from dense
        st.validate_rwd(VectorFormat::Dense).unwrap();
        assert!(!st.is_valid(VectorFormat::Coo));
        st.validate_rw(VectorFormat::Coo).unwrap();
        assert_eq!(st.coo().unwrap().ai, vec![1, 3]);
        assert_eq!(st.coo().unwrap().ax, vec![10, 30]);
    }

    #[test]
    fn test_nvals() {
        let mut st = VectorStorage::<i32>::new(5);
        assert_eq!(st.nvals(), 0);
        st.validate_wd(VectorFormat::Coo).unwrap();
        st.coo_mut().unwrap().insert(2, 1, |_, b| b);
        assert_eq!(st.nvals(), 1);
    }

    #[test]
    fn test_invalidate_keeps_no_valid_slot() {
        let mut st = VectorStorage::<i32>::new(3);
        st.validate_rw(VectorFormat::Dense).unwrap();
        st.invalidate();
        assert!(!st.any_valid());
        assert!(st.dense().is_err());
    }
}
