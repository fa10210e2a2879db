//! Algorithm registry
//!
//! The registry maps an operation name to a priority-ordered list of
//! algorithms for one element type. Registries are process-wide, built
//! lazily on first dispatch for a given element type, and immutable
//! once published. `reset` drops every registry so tests can observe a
//! cold start.

use super::signature::Signature;
use super::task::Task;
use crate::backend::Backend;
use crate::dtype::Element;
use crate::error::Result;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// One concrete implementation of a dispatchable operation
pub trait Algorithm<T: Element>: Send + Sync {
    /// Operation name this algorithm implements (registry key)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str {
        ""
    }

    /// Backend this algorithm runs on
    fn backend(&self) -> Backend;

    /// Relative cost among candidates with equal conversion cost
    fn cost_hint(&self) -> u32 {
        10
    }

    /// Input formats this algorithm wants for `task`, in the order of
    /// [`Task::inputs`]; `None` if the task shape is not supported
    fn signature(&self, task: &Task<'_, T>) -> Option<Signature>;

    /// Run the operation. The algorithm validates its input formats and
    /// the output's write mode itself.
    fn execute(&self, task: &Task<'_, T>) -> Result<()>;
}

/// Priority-ordered algorithm lists for one element type
pub struct AlgorithmRegistry<T: Element> {
    algos: HashMap<&'static str, Vec<Arc<dyn Algorithm<T>>>>,
}

impl<T: Element> AlgorithmRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            algos: HashMap::new(),
        }
    }

    /// Append an algorithm to its operation's priority list
    pub fn add(&mut self, algo: Arc<dyn Algorithm<T>>) {
        self.algos.entry(algo.name()).or_default().push(algo);
    }

    /// Priority list for an operation, highest priority first
    pub fn get(&self, name: &str) -> Option<&[Arc<dyn Algorithm<T>>]> {
        self.algos.get(name).map(Vec::as_slice)
    }

    /// Registered operation names
    pub fn operations(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.algos.keys().copied()
    }
}

impl<T: Element> Default for AlgorithmRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRIES: OnceLock<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> = OnceLock::new();

fn registries() -> &'static Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>> {
    REGISTRIES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// The process-wide registry for element type `T`
///
/// Built on first use: host algorithms always, accelerator algorithms
/// when the `wgpu` feature is enabled, the type carries values, and an
/// adapter is available. Accelerator entries precede host entries so
/// device-resident data dispatches without conversions.
pub fn global<T: Element>() -> Arc<AlgorithmRegistry<T>> {
    let mut guard = registries().lock();
    if let Some(existing) = guard.get(&TypeId::of::<T>()) {
        return existing
            .clone()
            .downcast::<AlgorithmRegistry<T>>()
            .expect("registry entries are keyed by element TypeId");
    }

    let mut reg = AlgorithmRegistry::new();
    #[cfg(feature = "wgpu")]
    if T::DTYPE.has_values() && crate::backend::acc::is_available() {
        crate::backend::acc::register(&mut reg);
    }
    crate::backend::cpu::register(&mut reg);

    let reg: Arc<AlgorithmRegistry<T>> = Arc::new(reg);
    guard.insert(TypeId::of::<T>(), reg.clone());
    reg
}

/// Drop every published registry (test hook)
pub fn reset() {
    registries().lock().clear();
}
