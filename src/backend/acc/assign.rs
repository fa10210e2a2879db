//! Accelerated masked vector assignment

use super::pipeline::{workgroup_count, LayoutKey};
use super::{context, shaders};
use crate::backend::Backend;
use crate::block::VectorFormat;
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct AssignParams {
    n: u32,
    value_bits: u32,
    pad0: u32,
    pad1: u32,
}

fn sparse_mask<T: Element>(mask: &crate::container::Vector<T>) -> bool {
    mask.storage()
        .map(|st| {
            st.is_valid(VectorFormat::Coo) || st.is_valid(VectorFormat::AccCoo)
        })
        .unwrap_or(false)
}

/// Data-parallel masked assignment into a device dense vector
///
/// A sparse mask launches one thread per stored mask entry; a dense
/// mask launches one thread per index. Mask indices are duplicate-free,
/// so cells need no atomics.
pub struct VAssignMaskedAcc;

impl<T: Element> Algorithm<T> for VAssignMaskedAcc {
    fn name(&self) -> &'static str {
        "v_assign_masked"
    }

    fn description(&self) -> &'static str {
        "parallel masked vector assignment on the accelerator"
    }

    fn backend(&self) -> Backend {
        Backend::Acc
    }

    fn cost_hint(&self) -> u32 {
        5
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        let Task::VAssignMasked { mask, .. } = task else {
            return None;
        };
        let fmt = if sparse_mask(mask) {
            VectorFormat::AccCoo
        } else {
            VectorFormat::AccDense
        };
        Some(Signature::new([SlotReq::Vector(fmt)]))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VAssignMasked { r, .. } = task else {
            return Err(Error::invalid_argument("task", "expected v_assign_masked"));
        };
        let result = run(task);
        if matches!(result, Err(Error::Execution(_))) {
            if let Ok(mut st) = r.storage_mut() {
                st.invalidate();
            }
        }
        result
    }
}

fn run<T: Element>(task: &Task<'_, T>) -> Result<()> {
    let Task::VAssignMasked {
        r,
        mask,
        value,
        op_assign,
        op_select,
    } = task
    else {
        return Err(Error::invalid_argument("task", "expected v_assign_masked"));
    };

    if mask.n_rows() != r.n_rows() {
        return Err(Error::invalid_argument(
            "mask",
            "mask and output must have equal length",
        ));
    }

    let sparse = sparse_mask(mask);
    if sparse {
        mask.storage_mut()?.validate_rw(VectorFormat::AccCoo)?;
    } else {
        mask.storage_mut()?.validate_rw(VectorFormat::AccDense)?;
    }
    r.storage_mut()?.validate_rwd(VectorFormat::AccDense)?;

    let ctx = context()?;
    let mask_st = mask.storage()?;
    let r_st = r.storage()?;
    let r_acc = r_st.acc_dense()?;

    let sources = [op_assign.source(), op_select.source()];
    let key = shaders::specialisation_key("assign", T::DTYPE, &sources);
    let module = ctx.pipelines.get_or_compile(&key, || {
        shaders::generate_assign_shader(T::DTYPE, sources[0], sources[1])
    })?;
    let layout = ctx.pipelines.get_or_create_layout(LayoutKey {
        num_storage_buffers: 3,
    });

    let dummy;
    let entry: &'static str;
    let n: u32;
    let keys_buf: &wgpu::Buffer;
    let vals_buf: &wgpu::Buffer;
    if sparse {
        let mask_acc = mask_st.acc_coo()?;
        entry = "assign_sparse";
        n = mask_acc.nvals;
        keys_buf = &mask_acc.ai;
        vals_buf = &mask_acc.ax;
    } else {
        let mask_acc = mask_st.acc_dense()?;
        entry = "assign_dense";
        n = mask_acc.len;
        dummy = ctx.create_storage_buffer("graphr assign scratch", 4);
        keys_buf = &dummy;
        vals_buf = &mask_acc.ax;
    }

    let pipeline = ctx
        .pipelines
        .get_or_create_pipeline(&key, entry, &module, &layout)?;

    let params = AssignParams {
        n,
        value_bits: value.to_bits_u32(),
        pad0: 0,
        pad1: 0,
    };
    let params_buf = ctx.create_uniform_buffer(
        "graphr assign params",
        std::mem::size_of::<AssignParams>() as u64,
    );
    ctx.write_buffer(&params_buf, &[params]);

    let bind = ctx
        .pipelines
        .create_bind_group(&layout, &[keys_buf, vals_buf, &r_acc.ax, &params_buf]);

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("graphr assign"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("assign"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind, &[]);
        pass.dispatch_workgroups(workgroup_count(n), 1, 1);
    }
    ctx.submit_and_wait(encoder)
}
