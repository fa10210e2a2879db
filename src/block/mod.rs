//! Sparse block formats
//!
//! A container's logical content can be materialised in several physical
//! representations at once. Each representation is a "block"; the
//! storage manager keeps one slot per format and converts between them
//! lazily. Matrix blocks and vector blocks are tagged variants over a
//! small format enum, which keeps the storage layer free of inheritance
//! hierarchies.
//!
//! # Formats
//!
//! Matrices:
//! - **LIL**: per-row ordered list of `(col, val)`; cheap point writes.
//! - **DOK**: hash map keyed by `(row, col)`; O(1) point reads.
//! - **COO**: sorted row-major `(Ai, Aj, Ax)` triplets; canonical bulk
//!   build/read form and conversion hub.
//! - **CSR**: `(Ap, Aj, Ax)`; the kernel-facing form.
//!
//! Vectors:
//! - **COO**: sorted `(Ai, Ax)` pairs, duplicate-free.
//! - **Dense**: `Ax[n_rows]`, unstored entries hold the fill value.
//!
//! With the `wgpu` feature, device-resident mirrors (`AccCsr`, `AccCoo`,
//! `AccDense`) join the set; conversions to and from them are buffer
//! uploads and downloads.

pub mod convert;
mod coo;
mod csr;
mod dense;
mod dok;
mod lil;

pub use coo::{CooMat, CooVec};
pub use csr::CsrMat;
pub use dense::DenseVec;
pub use dok::DokMat;
pub use lil::LilMat;

#[cfg(feature = "wgpu")]
use crate::backend::acc::block::{AccCooVec, AccCsrMat, AccDenseVec};
use crate::dtype::Element;
use std::fmt;

/// Physical formats a matrix may be materialised in
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatrixFormat {
    /// List-of-lists, write-friendly
    Lil,
    /// Dictionary-of-keys, read-friendly
    Dok,
    /// Coordinate triplets, build/read canonical form
    Coo,
    /// Compressed sparse row, kernel form
    Csr,
    /// Device-resident CSR
    #[cfg(feature = "wgpu")]
    AccCsr,
}

impl MatrixFormat {
    /// Number of matrix format slots
    pub const COUNT: usize = if cfg!(feature = "wgpu") { 5 } else { 4 };

    /// Slot index of this format
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Lil => 0,
            Self::Dok => 1,
            Self::Coo => 2,
            Self::Csr => 3,
            #[cfg(feature = "wgpu")]
            Self::AccCsr => 4,
        }
    }

    /// All matrix formats in slot order
    pub const fn all() -> &'static [MatrixFormat] {
        #[cfg(feature = "wgpu")]
        {
            &[Self::Lil, Self::Dok, Self::Coo, Self::Csr, Self::AccCsr]
        }
        #[cfg(not(feature = "wgpu"))]
        {
            &[Self::Lil, Self::Dok, Self::Coo, Self::Csr]
        }
    }

    /// Format name for display
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lil => "lil",
            Self::Dok => "dok",
            Self::Coo => "coo",
            Self::Csr => "csr",
            #[cfg(feature = "wgpu")]
            Self::AccCsr => "acc-csr",
        }
    }
}

impl fmt::Display for MatrixFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Physical formats a vector may be materialised in
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VectorFormat {
    /// Sorted coordinate pairs
    Coo,
    /// Dense array of length `n_rows`
    Dense,
    /// Device-resident coordinate pairs
    #[cfg(feature = "wgpu")]
    AccCoo,
    /// Device-resident dense array
    #[cfg(feature = "wgpu")]
    AccDense,
}

impl VectorFormat {
    /// Number of vector format slots
    pub const COUNT: usize = if cfg!(feature = "wgpu") { 4 } else { 2 };

    /// Slot index of this format
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Coo => 0,
            Self::Dense => 1,
            #[cfg(feature = "wgpu")]
            Self::AccCoo => 2,
            #[cfg(feature = "wgpu")]
            Self::AccDense => 3,
        }
    }

    /// All vector formats in slot order
    pub const fn all() -> &'static [VectorFormat] {
        #[cfg(feature = "wgpu")]
        {
            &[Self::Coo, Self::Dense, Self::AccCoo, Self::AccDense]
        }
        #[cfg(not(feature = "wgpu"))]
        {
            &[Self::Coo, Self::Dense]
        }
    }

    /// Format name for display
    pub const fn name(self) -> &'static str {
        match self {
            Self::Coo => "coo",
            Self::Dense => "dense",
            #[cfg(feature = "wgpu")]
            Self::AccCoo => "acc-coo",
            #[cfg(feature = "wgpu")]
            Self::AccDense => "acc-dense",
        }
    }
}

impl fmt::Display for VectorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One materialisation of a matrix
pub enum MatrixBlock<T: Element> {
    /// List-of-lists block
    Lil(LilMat<T>),
    /// Dictionary-of-keys block
    Dok(DokMat<T>),
    /// Coordinate block
    Coo(CooMat<T>),
    /// Compressed sparse row block
    Csr(CsrMat<T>),
    /// Device CSR block
    #[cfg(feature = "wgpu")]
    AccCsr(AccCsrMat<T>),
}

impl<T: Element> MatrixBlock<T> {
    /// The format tag of this block
    pub fn format(&self) -> MatrixFormat {
        match self {
            Self::Lil(_) => MatrixFormat::Lil,
            Self::Dok(_) => MatrixFormat::Dok,
            Self::Coo(_) => MatrixFormat::Coo,
            Self::Csr(_) => MatrixFormat::Csr,
            #[cfg(feature = "wgpu")]
            Self::AccCsr(_) => MatrixFormat::AccCsr,
        }
    }
}

/// One materialisation of a vector
pub enum VectorBlock<T: Element> {
    /// Coordinate block
    Coo(CooVec<T>),
    /// Dense block
    Dense(DenseVec<T>),
    /// Device coordinate block
    #[cfg(feature = "wgpu")]
    AccCoo(AccCooVec<T>),
    /// Device dense block
    #[cfg(feature = "wgpu")]
    AccDense(AccDenseVec<T>),
}

impl<T: Element> VectorBlock<T> {
    /// The format tag of this block
    pub fn format(&self) -> VectorFormat {
        match self {
            Self::Coo(_) => VectorFormat::Coo,
            Self::Dense(_) => VectorFormat::Dense,
            #[cfg(feature = "wgpu")]
            Self::AccCoo(_) => VectorFormat::AccCoo,
            #[cfg(feature = "wgpu")]
            Self::AccDense(_) => VectorFormat::AccDense,
        }
    }
}
