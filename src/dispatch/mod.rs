//! Operation dispatch
//!
//! Dispatch turns a [`Task`] into a concrete kernel run. The engine
//! inspects the arguments' currently-valid formats, walks the
//! operation's priority list, and picks the first algorithm whose input
//! signature is satisfiable without conversions (ties broken by cost
//! hint). When no zero-conversion candidate exists it picks the
//! algorithm of least total conversion cost; the chosen algorithm then
//! validates its inputs (running the conversions) and its output's
//! write mode, and executes. Errors surface to the caller unchanged.

pub mod registry;
mod signature;
mod task;

pub use registry::{Algorithm, AlgorithmRegistry};
pub use signature::{Signature, SlotReq};
pub use task::{ArgRef, Task};

use crate::dtype::Element;
use crate::error::{Error, Result};

/// Total conversions needed to satisfy `sig` for the task's inputs
///
/// `None` when the signature does not match the argument kinds or a
/// format is unreachable.
fn total_conversion_cost<T: Element>(task: &Task<'_, T>, sig: &Signature) -> Option<u32> {
    let inputs = task.inputs();
    if inputs.len() != sig.reqs.len() {
        return None;
    }

    let mut total = 0u32;
    for (arg, req) in inputs.iter().zip(sig.reqs.iter()) {
        let cost = match (arg, req) {
            (ArgRef::Matrix(m), SlotReq::Matrix(fmt)) => {
                m.storage().ok()?.conversion_cost(*fmt)?
            }
            (ArgRef::Vector(v), SlotReq::Vector(fmt)) => {
                v.storage().ok()?.conversion_cost(*fmt)?
            }
            _ => return None,
        };
        total += cost;
    }
    Some(total)
}

/// Dispatch a task to the best-matching registered algorithm
pub fn dispatch<T: Element>(task: &Task<'_, T>) -> Result<()> {
    let reg = registry::global::<T>();
    let algos = reg.get(task.name()).ok_or(Error::NotImplemented {
        op: task.name(),
        dtype: T::DTYPE,
    })?;

    let mut best: Option<(usize, u32, u32)> = None; // (index, conversions, hint)
    for (idx, algo) in algos.iter().enumerate() {
        let Some(sig) = algo.signature(task) else {
            continue;
        };
        let Some(cost) = total_conversion_cost(task, &sig) else {
            continue;
        };
        let candidate = (idx, cost, algo.cost_hint());
        best = Some(match best {
            None => candidate,
            Some(cur) => {
                let (_, cur_cost, cur_hint) = cur;
                if (cost, algo.cost_hint()) < (cur_cost, cur_hint) {
                    candidate
                } else {
                    cur
                }
            }
        });
    }

    let (idx, _, _) = best.ok_or(Error::NotImplemented {
        op: task.name(),
        dtype: T::DTYPE,
    })?;
    algos[idx].execute(task)
}
