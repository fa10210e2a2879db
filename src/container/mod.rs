//! Typed containers
//!
//! `Matrix<T>`, `Vector<T>` and `Scalar<T>` are the public faces of the
//! engine. They own their storage exclusively and expose point access,
//! bulk build/read, and configuration. Containers are not thread-safe;
//! concurrent use from several threads needs external synchronisation.
//! Re-entrant access (for example using one container as both input and
//! output of an operation) is caught at the storage border and reported
//! as an invalid-state error.

mod matrix;
mod scalar;
mod vector;

pub use matrix::{Matrix, MatrixCooView};
pub use scalar::Scalar;
pub use vector::{Vector, VectorCooView};
