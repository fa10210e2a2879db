//! Accelerated element-wise map

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
struct MapParams {
    n: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
}

/// Data-parallel unary map over a device dense vector
pub struct VMapAcc;

impl<T: Element> Algorithm<T> for VMapAcc {
    fn name(&self) -> &'static str {
        "v_map"
    }

    fn description(&self) -> &'static str {
        "parallel element-wise map on the accelerator"
    }

    fn backend(&self) -> Backend {
        Backend::Acc
    }

    fn cost_hint(&self) -> u32 {
        5
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        matches!(task, Task::VMap { .. })
            .then(|| Signature::new([SlotReq::Vector(VectorFormat::AccDense)]))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VMap { r, v, op } = task else {
            return Err(Error::invalid_argument("task", "expected v_map"));
        };

        if v.n_rows() != r.n_rows() {
            return Err(Error::invalid_argument(
                "v",
                "map input and output must have equal length",
            ));
        }

        let result = run(r, v, op.source());
        if matches!(result, Err(Error::Execution(_))) {
            if let Ok(mut st) = r.storage_mut() {
                st.invalidate();
            }
        }
        result
    }
}

fn run<T: Element>(
    r: &crate::container::Vector<T>,
    v: &crate::container::Vector<T>,
    op_source: &str,
) -> Result<()> {
    v.storage_mut()?.validate_rw(VectorFormat::AccDense)?;
    r.storage_mut()?.validate_wd(VectorFormat::AccDense)?;

    let ctx = context()?;
    let v_st = v.storage()?;
    let r_st = r.storage()?;
    let v_acc = v_st.acc_dense()?;
    let r_acc = r_st.acc_dense()?;

    let sources = [op_source];
    let key = shaders::specialisation_key("map", T::DTYPE, &sources);
    let module = ctx
        .pipelines
        .get_or_compile(&key, || shaders::generate_map_shader(T::DTYPE, sources[0]))?;
    let layout = ctx.pipelines.get_or_create_layout(LayoutKey {
        num_storage_buffers: 2,
    });
    let pipeline = ctx
        .pipelines
        .get_or_create_pipeline(&key, "map_apply", &module, &layout)?;

    let params = MapParams {
        n: v_acc.len,
        pad0: 0,
        pad1: 0,
        pad2: 0,
    };
    let params_buf =
        ctx.create_uniform_buffer("graphr map params", std::mem::size_of::<MapParams>() as u64);
    ctx.write_buffer(&params_buf, &[params]);

    let bind = ctx
        .pipelines
        .create_bind_group(&layout, &[&v_acc.ax, &r_acc.ax, &params_buf]);

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("graphr map"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("map"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind, &[]);
        pass.dispatch_workgroups(workgroup_count(v_acc.len), 1, 1);
    }
    ctx.submit_and_wait(encoder)
}
