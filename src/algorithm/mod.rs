//! Graph algorithms
//!
//! BFS, single-source shortest paths, and PageRank, composed entirely
//! from the dispatched container operations. Each function runs
//! synchronously and leaves its result in the caller's output
//! container.

mod bfs;
mod pr;
mod sssp;

pub use bfs::{bfs, BFS_UNREACHED};
pub use pr::pr;
pub use sssp::sssp;
