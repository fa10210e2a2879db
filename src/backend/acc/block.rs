//! Device-resident blocks
//!
//! Mirrors of the host CSR matrix and COO/dense vector blocks living in
//! storage buffers. Conversion edges to and from these blocks are plain
//! uploads and downloads through the accelerator context.

use super::context;
use crate::block::{CooVec, CsrMat, DenseVec};
use crate::dtype::Element;
use crate::error::Result;
use std::marker::PhantomData;
use wgpu::Buffer;

/// CSR matrix in device memory
pub struct AccCsrMat<T: Element> {
    /// Row pointer buffer, `n_rows + 1` entries
    pub ap: Buffer,
    /// Column index buffer
    pub aj: Buffer,
    /// Value buffer
    pub ax: Buffer,
    /// Number of rows
    pub n_rows: u32,
    /// Number of stored entries
    pub nnz: u32,
    _marker: PhantomData<T>,
}

impl<T: Element> AccCsrMat<T> {
    /// Upload a host CSR block
    pub fn upload(csr: &CsrMat<T>) -> Result<Self> {
        let ctx = context()?;
        let ap = ctx.create_storage_buffer("graphr csr ap", (csr.ap.len() * 4) as u64);
        let aj = ctx.create_storage_buffer("graphr csr aj", (csr.aj.len() * 4) as u64);
        let ax = ctx.create_storage_buffer(
            "graphr csr ax",
            (csr.ax.len() * std::mem::size_of::<T>()) as u64,
        );
        ctx.write_buffer(&ap, &csr.ap);
        ctx.write_buffer(&aj, &csr.aj);
        ctx.write_buffer(&ax, &csr.ax);
        Ok(Self {
            ap,
            aj,
            ax,
            n_rows: csr.n_rows() as u32,
            nnz: csr.nvals() as u32,
            _marker: PhantomData,
        })
    }

    /// Download into a host CSR block
    pub fn download(&self) -> Result<CsrMat<T>> {
        let ctx = context()?;
        Ok(CsrMat {
            ap: ctx.download(&self.ap, self.n_rows as usize + 1)?,
            aj: ctx.download(&self.aj, self.nnz as usize)?,
            ax: ctx.download(&self.ax, self.nnz as usize)?,
        })
    }
}

/// Sorted coordinate vector in device memory
pub struct AccCooVec<T: Element> {
    /// Index buffer
    pub ai: Buffer,
    /// Value buffer
    pub ax: Buffer,
    /// Number of stored entries
    pub nvals: u32,
    _marker: PhantomData<T>,
}

impl<T: Element> AccCooVec<T> {
    /// Upload a host COO vector block
    pub fn upload(coo: &CooVec<T>) -> Result<Self> {
        let ctx = context()?;
        let ai = ctx.create_storage_buffer("graphr coo ai", (coo.ai.len() * 4) as u64);
        let ax = ctx.create_storage_buffer(
            "graphr coo ax",
            (coo.ax.len() * std::mem::size_of::<T>()) as u64,
        );
        ctx.write_buffer(&ai, &coo.ai);
        ctx.write_buffer(&ax, &coo.ax);
        Ok(Self {
            ai,
            ax,
            nvals: coo.nvals() as u32,
            _marker: PhantomData,
        })
    }

    /// Download into a host COO vector block
    pub fn download(&self) -> Result<CooVec<T>> {
        let ctx = context()?;
        Ok(CooVec {
            ai: ctx.download(&self.ai, self.nvals as usize)?,
            ax: ctx.download(&self.ax, self.nvals as usize)?,
        })
    }
}

/// Dense vector in device memory
pub struct AccDenseVec<T: Element> {
    /// Value buffer, one element per index
    pub ax: Buffer,
    /// Vector length
    pub len: u32,
    _marker: PhantomData<T>,
}

impl<T: Element> AccDenseVec<T> {
    /// Upload a host dense block
    pub fn upload(dense: &DenseVec<T>) -> Result<Self> {
        let ctx = context()?;
        let ax = ctx.create_storage_buffer(
            "graphr dense ax",
            (dense.len() * std::mem::size_of::<T>()) as u64,
        );
        ctx.write_buffer(&ax, &dense.ax);
        Ok(Self {
            ax,
            len: dense.len() as u32,
            _marker: PhantomData,
        })
    }

    /// Download into a host dense block
    pub fn download(&self) -> Result<DenseVec<T>> {
        let ctx = context()?;
        Ok(DenseVec {
            ax: ctx.download(&self.ax, self.len as usize)?,
        })
    }
}
