//! Execution backends
//!
//! The host backend is always present and implements every operation
//! sequentially. The accelerator backend (behind the `wgpu` feature)
//! runs data-parallel kernels compiled from operator source snippets;
//! it registers itself only when a usable adapter exists at process
//! start.

pub mod cpu;

#[cfg(feature = "wgpu")]
pub mod acc;

use std::fmt;

/// Identifies which backend an algorithm executes on
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Sequential host execution
    Host,
    /// Data-parallel accelerator execution
    Acc,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Acc => write!(f, "acc"),
        }
    }
}
