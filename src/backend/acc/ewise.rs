//! Accelerated dense element-wise combine

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
struct EwiseParams {
    n: u32,
    has_mask: u32,
    fill_bits: u32,
    pad0: u32,
}

/// Index-parallel masked combine of two device dense vectors
///
/// Sparse operands stay on the host merge path; this kernel only bids
/// when both inputs are already dense on the device.
pub struct VEwiseAddMaskedAcc;

impl<T: Element> Algorithm<T> for VEwiseAddMaskedAcc {
    fn name(&self) -> &'static str {
        "v_ewise_add_masked"
    }

    fn description(&self) -> &'static str {
        "parallel dense element-wise combine on the accelerator"
    }

    fn backend(&self) -> Backend {
        Backend::Acc
    }

    fn cost_hint(&self) -> u32 {
        5
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        let Task::VEwiseAddMasked { a, b, mask, .. } = task else {
            return None;
        };
        let device_dense = |x: &crate::container::Vector<T>| {
            x.storage()
                .map(|st| {
                    st.is_valid(VectorFormat::AccDense) || st.is_valid(VectorFormat::Dense)
                })
                .unwrap_or(false)
        };
        if !device_dense(a) || !device_dense(b) {
            return None;
        }
        let mut reqs = vec![
            SlotReq::Vector(VectorFormat::AccDense),
            SlotReq::Vector(VectorFormat::AccDense),
        ];
        if mask.is_some() {
            reqs.push(SlotReq::Vector(VectorFormat::AccDense));
        }
        Some(Signature::new(reqs))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VEwiseAddMasked { r, .. } = task else {
            return Err(Error::invalid_argument(
                "task",
                "expected v_ewise_add_masked",
            ));
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
    let Task::VEwiseAddMasked {
        r,
        mask,
        a,
        b,
        op,
        op_select,
    } = task
    else {
        return Err(Error::invalid_argument(
            "task",
            "expected v_ewise_add_masked",
        ));
    };

    if a.n_rows() != r.n_rows() || b.n_rows() != r.n_rows() {
        return Err(Error::invalid_argument(
            "a",
            "element-wise operands must share the output length",
        ));
    }

    a.storage_mut()?.validate_rw(VectorFormat::AccDense)?;
    b.storage_mut()?.validate_rw(VectorFormat::AccDense)?;
    if let Some(mask) = mask {
        mask.storage_mut()?.validate_rw(VectorFormat::AccDense)?;
    }
    r.storage_mut()?.validate_wd(VectorFormat::AccDense)?;

    let ctx = context()?;
    let a_st = a.storage()?;
    let b_st = b.storage()?;
    let mask_st = match mask {
        Some(mask) => Some(mask.storage()?),
        None => None,
    };
    let r_st = r.storage()?;

    let a_acc = a_st.acc_dense()?;
    let b_acc = b_st.acc_dense()?;
    let r_acc = r_st.acc_dense()?;

    let sources = [op.source(), op_select.source()];
    let key = shaders::specialisation_key("ewise", T::DTYPE, &sources);
    let module = ctx.pipelines.get_or_compile(&key, || {
        shaders::generate_ewise_shader(T::DTYPE, sources[0], sources[1])
    })?;
    let layout = ctx.pipelines.get_or_create_layout(LayoutKey {
        num_storage_buffers: 4,
    });
    let pipeline = ctx
        .pipelines
        .get_or_create_pipeline(&key, "ewise_apply", &module, &layout)?;

    let dummy;
    let mask_buf = match mask_st.as_ref() {
        Some(st) => &st.acc_dense()?.ax,
        None => {
            dummy = ctx.create_storage_buffer("graphr ewise scratch", 4);
            &dummy
        }
    };

    let params = EwiseParams {
        n: r_acc.len,
        has_mask: mask.is_some() as u32,
        fill_bits: r_st.fill_value().to_bits_u32(),
        pad0: 0,
    };
    let params_buf = ctx.create_uniform_buffer(
        "graphr ewise params",
        std::mem::size_of::<EwiseParams>() as u64,
    );
    ctx.write_buffer(&params_buf, &[params]);

    let bind = ctx.pipelines.create_bind_group(
        &layout,
        &[&a_acc.ax, &b_acc.ax, mask_buf, &r_acc.ax, &params_buf],
    );

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("graphr ewise"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("ewise"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind, &[]);
        pass.dispatch_workgroups(workgroup_count(r_acc.len), 1, 1);
    }
    ctx.submit_and_wait(encoder)
}
