//! Storage manager for matrices

use crate::block::{convert, CooMat, CsrMat, DokMat, LilMat, MatrixBlock, MatrixFormat};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::op::{self, OpBinaryRef};

/// Conversion adjacency: formats directly reachable from `f`
///
/// COO is the hub; LIL and DOK funnel through it, CSR round-trips with
/// it, and the device CSR mirrors the host CSR.
pub(crate) fn conversion_edges(f: MatrixFormat) -> &'static [MatrixFormat] {
    match f {
        MatrixFormat::Lil => &[MatrixFormat::Coo],
        MatrixFormat::Dok => &[MatrixFormat::Coo],
        MatrixFormat::Coo => &[MatrixFormat::Csr, MatrixFormat::Lil, MatrixFormat::Dok],
        #[cfg(feature = "wgpu")]
        MatrixFormat::Csr => &[MatrixFormat::Coo, MatrixFormat::AccCsr],
        #[cfg(not(feature = "wgpu"))]
        MatrixFormat::Csr => &[MatrixFormat::Coo],
        #[cfg(feature = "wgpu")]
        MatrixFormat::AccCsr => &[MatrixFormat::Csr],
    }
}

/// Format slots, validity bits, and logical metadata of one matrix
pub struct MatrixStorage<T: Element> {
    n_rows: u32,
    n_cols: u32,
    fill_value: T,
    reduce: OpBinaryRef<T>,
    slots: Vec<Option<MatrixBlock<T>>>,
    valid: u8,
}

impl<T: Element> MatrixStorage<T> {
    /// Create an empty storage (no valid slot) with the given dimensions
    pub fn new(n_rows: u32, n_cols: u32) -> Self {
        let mut slots = Vec::with_capacity(MatrixFormat::COUNT);
        slots.resize_with(MatrixFormat::COUNT, || None);
        Self {
            n_rows,
            n_cols,
            fill_value: T::zero(),
            reduce: op::second(),
            slots,
            valid: 0,
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

    /// The value every unstored cell is taken to equal
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

    /// Register the operator used to merge duplicate coordinates
    pub fn set_reduce(&mut self, reduce: OpBinaryRef<T>) {
        self.reduce = reduce;
    }

    /// True if `fmt` currently holds the container's content
    #[inline]
    pub fn is_valid(&self, fmt: MatrixFormat) -> bool {
        self.valid & (1 << fmt.index()) != 0
    }

    /// True if any slot is valid (the container holds data)
    #[inline]
    pub fn any_valid(&self) -> bool {
        self.valid != 0
    }

    /// Clear every validity flag without freeing buffers
    pub fn invalidate(&mut self) {
        self.valid = 0;
    }

    /// Number of conversions needed to make `fmt` valid
    ///
    /// Zero when already valid, one for an empty container (a fresh
    /// default is constructed), `None` when unreachable.
    pub fn conversion_cost(&self, fmt: MatrixFormat) -> Option<u32> {
        if self.is_valid(fmt) {
            return Some(0);
        }
        if !self.any_valid() {
            return Some(1);
        }
        super::shortest_conversion_path(
            MatrixFormat::all(),
            MatrixFormat::index,
            conversion_edges,
            |f| self.is_valid(f),
            fmt,
        )
        .map(|path| path.len() as u32 - 1)
    }

    /// Ensure `fmt` is valid, converting from the nearest valid slot
    pub fn validate_rw(&mut self, fmt: MatrixFormat) -> Result<()> {
        if self.is_valid(fmt) {
            return Ok(());
        }
        if !self.any_valid() {
            self.slots[fmt.index()] = Some(self.default_block(fmt)?);
            self.valid |= 1 << fmt.index();
            return Ok(());
        }
        let path = super::shortest_conversion_path(
            MatrixFormat::all(),
            MatrixFormat::index,
            conversion_edges,
            |f| self.is_valid(f),
            fmt,
        )
        .ok_or_else(|| {
            Error::invalid_state(format!("no conversion path to matrix format {fmt}"))
        })?;
        for win in path.windows(2) {
            if !self.is_valid(win[1]) {
                self.convert_edge(win[0], win[1])?;
            }
        }
        Ok(())
    }

    /// `validate_rw`, then invalidate every other slot (caller mutates)
    pub fn validate_rwd(&mut self, fmt: MatrixFormat) -> Result<()> {
        self.validate_rw(fmt)?;
        self.valid = 1 << fmt.index();
        Ok(())
    }

    /// Install a fresh default block for `fmt` and mark only it valid
    /// (caller fully overwrites)
    pub fn validate_wd(&mut self, fmt: MatrixFormat) -> Result<()> {
        self.slots[fmt.index()] = Some(self.default_block(fmt)?);
        self.valid = 1 << fmt.index();
        Ok(())
    }

    /// Number of stored entries, read from the cheapest valid slot
    pub fn nvals(&self) -> usize {
        for fmt in MatrixFormat::all() {
            if !self.is_valid(*fmt) {
                continue;
            }
            match self.slots[fmt.index()].as_ref() {
                Some(MatrixBlock::Coo(b)) => return b.nvals(),
                Some(MatrixBlock::Csr(b)) => return b.nvals(),
                Some(MatrixBlock::Lil(b)) => return b.nvals(),
                Some(MatrixBlock::Dok(b)) => return b.nvals(),
                _ => continue,
            }
        }
        0
    }

    fn default_block(&self, fmt: MatrixFormat) -> Result<MatrixBlock<T>> {
        Ok(match fmt {
            MatrixFormat::Lil => MatrixBlock::Lil(LilMat::new(self.n_rows)),
            MatrixFormat::Dok => MatrixBlock::Dok(DokMat::new()),
            MatrixFormat::Coo => MatrixBlock::Coo(CooMat::new()),
            MatrixFormat::Csr => MatrixBlock::Csr(CsrMat::new(self.n_rows)),
            #[cfg(feature = "wgpu")]
            MatrixFormat::AccCsr => MatrixBlock::AccCsr(
                crate::backend::acc::block::AccCsrMat::upload(&CsrMat::new(self.n_rows))?,
            ),
        })
    }

    fn convert_edge(&mut self, from: MatrixFormat, to: MatrixFormat) -> Result<()> {
        let block = match (from, to) {
            (MatrixFormat::Lil, MatrixFormat::Coo) => {
                let reduce = self.reduce.clone();
                let lil = self.lil()?;
                MatrixBlock::Coo(convert::lil_to_coo(lil, |a, b| reduce.apply(a, b)))
            }
            (MatrixFormat::Dok, MatrixFormat::Coo) => {
                MatrixBlock::Coo(convert::dok_to_coo(self.dok()?))
            }
            (MatrixFormat::Coo, MatrixFormat::Csr) => {
                MatrixBlock::Csr(convert::coo_to_csr(self.n_rows, self.coo()?))
            }
            (MatrixFormat::Coo, MatrixFormat::Lil) => {
                MatrixBlock::Lil(convert::coo_to_lil(self.n_rows, self.coo()?))
            }
            (MatrixFormat::Coo, MatrixFormat::Dok) => {
                MatrixBlock::Dok(convert::coo_to_dok(self.coo()?))
            }
            (MatrixFormat::Csr, MatrixFormat::Coo) => {
                MatrixBlock::Coo(convert::csr_to_coo(self.csr()?))
            }
            #[cfg(feature = "wgpu")]
            (MatrixFormat::Csr, MatrixFormat::AccCsr) => MatrixBlock::AccCsr(
                crate::backend::acc::block::AccCsrMat::upload(self.csr()?)?,
            ),
            #[cfg(feature = "wgpu")]
            (MatrixFormat::AccCsr, MatrixFormat::Csr) => {
                MatrixBlock::Csr(self.acc_csr()?.download()?)
            }
            (from, to) => {
                return Err(Error::Internal(format!(
                    "no matrix conversion edge {from} -> {to}"
                )))
            }
        };
        self.slots[to.index()] = Some(block);
        self.valid |= 1 << to.index();
        Ok(())
    }

    /// Valid LIL block
    pub fn lil(&self) -> Result<&LilMat<T>> {
        match self.slots[MatrixFormat::Lil.index()].as_ref() {
            Some(MatrixBlock::Lil(b)) if self.is_valid(MatrixFormat::Lil) => Ok(b),
            _ => Err(Error::invalid_state("lil block not materialised")),
        }
    }

    /// Valid LIL block, mutable
    pub fn lil_mut(&mut self) -> Result<&mut LilMat<T>> {
        if !self.is_valid(MatrixFormat::Lil) {
            return Err(Error::invalid_state("lil block not materialised"));
        }
        match self.slots[MatrixFormat::Lil.index()].as_mut() {
            Some(MatrixBlock::Lil(b)) => Ok(b),
            _ => Err(Error::invalid_state("lil block not materialised")),
        }
    }

    /// Valid DOK block
    pub fn dok(&self) -> Result<&DokMat<T>> {
        match self.slots[MatrixFormat::Dok.index()].as_ref() {
            Some(MatrixBlock::Dok(b)) if self.is_valid(MatrixFormat::Dok) => Ok(b),
            _ => Err(Error::invalid_state("dok block not materialised")),
        }
    }

    /// Valid COO block
    pub fn coo(&self) -> Result<&CooMat<T>> {
        match self.slots[MatrixFormat::Coo.index()].as_ref() {
            Some(MatrixBlock::Coo(b)) if self.is_valid(MatrixFormat::Coo) => Ok(b),
            _ => Err(Error::invalid_state("coo block not materialised")),
        }
    }

    /// Valid COO block, mutable
    pub fn coo_mut(&mut self) -> Result<&mut CooMat<T>> {
        if !self.is_valid(MatrixFormat::Coo) {
            return Err(Error::invalid_state("coo block not materialised"));
        }
        match self.slots[MatrixFormat::Coo.index()].as_mut() {
            Some(MatrixBlock::Coo(b)) => Ok(b),
            _ => Err(Error::invalid_state("coo block not materialised")),
        }
    }

    /// Valid CSR block
    pub fn csr(&self) -> Result<&CsrMat<T>> {
        match self.slots[MatrixFormat::Csr.index()].as_ref() {
            Some(MatrixBlock::Csr(b)) if self.is_valid(MatrixFormat::Csr) => Ok(b),
            _ => Err(Error::invalid_state("csr block not materialised")),
        }
    }

    /// Valid CSR block, mutable
    pub fn csr_mut(&mut self) -> Result<&mut CsrMat<T>> {
        if !self.is_valid(MatrixFormat::Csr) {
            return Err(Error::invalid_state("csr block not materialised"));
        }
        match self.slots[MatrixFormat::Csr.index()].as_mut() {
            Some(MatrixBlock::Csr(b)) => Ok(b),
            _ => Err(Error::invalid_state("csr block not materialised")),
        }
    }

    /// Valid device CSR block
    #[cfg(feature = "wgpu")]
    pub fn acc_csr(&self) -> Result<&crate::backend::acc::block::AccCsrMat<T>> {
        match self.slots[MatrixFormat::AccCsr.index()].as_ref() {
            Some(MatrixBlock::AccCsr(b)) if self.is_valid(MatrixFormat::AccCsr) => Ok(b),
            _ => Err(Error::invalid_state("acc-csr block not materialised")),
        }
    }
}
