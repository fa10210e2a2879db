//! Accelerated reduction

use super::pipeline::LayoutKey;
use super::{context, shaders};
use crate::backend::Backend;
use crate::block::VectorFormat;
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ReduceParams {
    n: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
}

/// Block-wise tree reduction with relaunch
///
/// Each launch folds 256-wide segments into one partial per workgroup;
/// the host relaunches over the partials until a single value remains,
/// then folds the caller's seed in on the host. `op_reduce` must be
/// associative; blocks never race, so commutativity is not needed here.
pub struct VReduceAcc;

impl<T: Element> Algorithm<T> for VReduceAcc {
    fn name(&self) -> &'static str {
        "v_reduce"
    }

    fn description(&self) -> &'static str {
        "parallel tree reduction on the accelerator"
    }

    fn backend(&self) -> Backend {
        Backend::Acc
    }

    fn cost_hint(&self) -> u32 {
        5
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        matches!(task, Task::VReduce { .. })
            .then(|| Signature::new([SlotReq::Vector(VectorFormat::AccDense)]))
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VReduce {
            r,
            init,
            v,
            op_reduce,
        } = task
        else {
            return Err(Error::invalid_argument("task", "expected v_reduce"));
        };

        v.storage_mut()?.validate_rw(VectorFormat::AccDense)?;

        let ctx = context()?;
        let v_st = v.storage()?;
        let v_acc = v_st.acc_dense()?;

        let n = v_acc.len;
        if n == 0 {
            r.set_value(*init);
            return Ok(());
        }

        let sources = [op_reduce.source()];
        let key = shaders::specialisation_key("reduce", T::DTYPE, &sources);
        let module = ctx
            .pipelines
            .get_or_compile(&key, || shaders::generate_reduce_shader(T::DTYPE, sources[0]))?;
        let layout = ctx.pipelines.get_or_create_layout(LayoutKey {
            num_storage_buffers: 2,
        });
        let pipeline = ctx
            .pipelines
            .get_or_create_pipeline(&key, "reduce_partial", &module, &layout)?;

        let elem = std::mem::size_of::<T>() as u64;
        let partials = n.div_ceil(256).max(1) as u64;
        let scratch_a = ctx.create_storage_buffer("graphr reduce a", partials * elem);
        let scratch_b = ctx.create_storage_buffer("graphr reduce b", partials * elem);

        let mut src = &v_acc.ax;
        let mut dst = &scratch_a;
        let mut cur_n = n;

        while cur_n > 1 {
            let groups = cur_n.div_ceil(256);

            let params = ReduceParams {
                n: cur_n,
                pad0: 0,
                pad1: 0,
                pad2: 0,
            };
            let params_buf = ctx.create_uniform_buffer(
                "graphr reduce params",
                std::mem::size_of::<ReduceParams>() as u64,
            );
            ctx.write_buffer(&params_buf, &[params]);

            let bind = ctx
                .pipelines
                .create_bind_group(&layout, &[src, dst, &params_buf]);

            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("graphr reduce"),
                });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("reduce"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&pipeline);
                pass.set_bind_group(0, &bind, &[]);
                pass.dispatch_workgroups(groups, 1, 1);
            }
            ctx.submit_and_wait(encoder)?;

            cur_n = groups;
            src = dst;
            dst = if std::ptr::eq(src, &scratch_a) {
                &scratch_b
            } else {
                &scratch_a
            };
        }

        let folded: Vec<T> = ctx.download(src, 1)?;
        r.set_value(op_reduce.apply(*init, folded[0]));
        Ok(())
    }
}
