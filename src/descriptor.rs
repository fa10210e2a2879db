//! Operation descriptors
//!
//! A descriptor carries the optional hints a caller may attach to an
//! operation or a graph algorithm. Unknown combinations are simply
//! ignored by kernels that do not recognise them.

/// Hints recognised by operations and graph algorithms
#[derive(Copy, Clone, Debug)]
pub struct Descriptor {
    /// Permit kernels to stop updating an output cell once it holds a
    /// non-fill value (first-write-wins)
    pub early_exit: bool,
    /// Reserved: direction-optimised traversal
    pub push_pull: bool,
    /// Bulk-build inputs are already sorted by key
    pub values_sorted: bool,
    /// Bulk-build inputs carry no duplicate keys
    pub no_duplicates: bool,
    /// Iteration cap for fixed-point algorithms; zero means the
    /// algorithm's own bound
    pub max_iterations: u32,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            early_exit: false,
            push_pull: false,
            values_sorted: false,
            no_duplicates: false,
            max_iterations: 0,
        }
    }
}

impl Descriptor {
    /// Descriptor with every hint off
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the early-exit hint
    pub fn with_early_exit(mut self) -> Self {
        self.early_exit = true;
        self
    }

    /// Set the iteration cap
    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptor() {
        let d = Descriptor::default();
        assert!(!d.early_exit);
        assert_eq!(d.max_iterations, 0);
    }

    #[test]
    fn test_builders() {
        let d = Descriptor::new().with_early_exit().with_max_iterations(8);
        assert!(d.early_exit);
        assert_eq!(d.max_iterations, 8);
    }
}
