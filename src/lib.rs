//! # graphr
//!
//! **GraphBLAS-style sparse linear algebra with multi-backend execution.**
//!
//! graphr executes graph algorithms expressed over sparse matrices,
//! sparse vectors and scalars, parameterised by user-chosen semirings
//! (a combine operator, a reduce operator, and a select predicate).
//! Containers keep their content in several physical formats at once
//! and materialise the one the next kernel wants lazily; a dispatcher
//! picks the concrete kernel per (operation, element type, resident
//! formats, backend).
//!
//! ## Why graphr?
//!
//! - **Multi-format storage**: COO, CSR, LIL, DOK and dense blocks with
//!   lazy conversion along the cheapest path
//! - **Semiring injection**: operators carry a host callable and a WGSL
//!   source snippet, so one kernel source serves every semiring
//! - **Multi-backend**: sequential host kernels always, data-parallel
//!   WebGPU kernels behind the `wgpu` feature
//! - **Graph algorithms included**: BFS, single-source shortest paths,
//!   PageRank, built from the public operations
//!
//! ## Quick Start
//!
//! ```
//! use graphr::prelude::*;
//!
//! // 6-vertex path-ish graph
//! let a = Matrix::<i32>::new(6, 6);
//! a.build(&[0, 0, 1, 2, 3, 4], &[1, 2, 3, 3, 4, 5], &[1; 6])?;
//!
//! let v = Vector::<i32>::new(6);
//! graphr::algorithm::bfs(&v, &a, 0, &Descriptor::default())?;
//! assert_eq!(v.get_int(5)?, 4);
//! # Ok::<(), graphr::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded dense host kernels
//! - `wgpu`: WebGPU accelerator backend; the engine falls back to host
//!   execution when no adapter is available at runtime

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithm;
pub mod backend;
pub mod block;
pub mod container;
pub mod descriptor;
pub mod dispatch;
pub mod dtype;
pub mod error;
pub mod exec;
pub mod op;
pub mod storage;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::block::{MatrixFormat, VectorFormat};
    pub use crate::container::{Matrix, Scalar, Vector};
    pub use crate::descriptor::Descriptor;
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::exec::*;
}
