//! Accelerated masked vector-matrix product

use super::pipeline::{workgroup_count, LayoutKey, MAX_GROUPS};
use super::{context, shaders};
use crate::backend::Backend;
use crate::block::{MatrixFormat, VectorFormat};
use crate::dispatch::{Algorithm, Signature, SlotReq, Task};
use crate::dtype::Element;
use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct VxmParams {
    n_rows: u32,
    n_cols: u32,
    early_exit: u32,
    init_bits: u32,
    fill_v_bits: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
}

/// Data-parallel masked vxm over a device CSR matrix
///
/// A prepare launch seeds every output cell with the initial value;
/// the main launch walks one row per thread (scalar variant) or one row
/// per workgroup with 64 lanes on the inner traversal (vector variant,
/// chosen for long average rows). Cross-thread combines go through an
/// atomic compare-exchange loop over the bit pattern of the cell, so
/// `op_add` must be commutative and associative for the result to be
/// deterministic in value.
pub struct VxmMaskedAcc;

impl<T: Element> Algorithm<T> for VxmMaskedAcc {
    fn name(&self) -> &'static str {
        "vxm_masked"
    }

    fn description(&self) -> &'static str {
        "parallel masked vector-matrix product on the accelerator"
    }

    fn backend(&self) -> Backend {
        Backend::Acc
    }

    fn cost_hint(&self) -> u32 {
        5
    }

    fn signature(&self, task: &Task<'_, T>) -> Option<Signature> {
        matches!(task, Task::VxmMasked { .. }).then(|| {
            Signature::new([
                SlotReq::Vector(VectorFormat::AccDense),
                SlotReq::Matrix(MatrixFormat::AccCsr),
                SlotReq::Vector(VectorFormat::AccDense),
            ])
        })
    }

    fn execute(&self, task: &Task<'_, T>) -> Result<()> {
        let Task::VxmMasked { r, .. } = task else {
            return Err(Error::invalid_argument("task", "expected vxm_masked"));
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
    let Task::VxmMasked {
        r,
        mask,
        v,
        m,
        op_multiply,
        op_add,
        op_select,
        init,
        desc,
    } = task
    else {
        return Err(Error::invalid_argument("task", "expected vxm_masked"));
    };

    if v.n_rows() != m.n_rows() || r.n_rows() != m.n_cols() || mask.n_rows() != m.n_cols() {
        return Err(Error::invalid_argument(
            "v",
            "vxm operand dimensions do not agree",
        ));
    }

    v.storage_mut()?.validate_rw(VectorFormat::AccDense)?;
    m.storage_mut()?.validate_rw(MatrixFormat::AccCsr)?;
    mask.storage_mut()?.validate_rw(VectorFormat::AccDense)?;
    r.storage_mut()?.validate_wd(VectorFormat::AccDense)?;

    let ctx = context()?;
    let v_st = v.storage()?;
    let m_st = m.storage()?;
    let mask_st = mask.storage()?;
    let r_st = r.storage()?;

    let v_acc = v_st.acc_dense()?;
    let m_acc = m_st.acc_csr()?;
    let mask_acc = mask_st.acc_dense()?;
    let r_acc = r_st.acc_dense()?;

    let sources = [op_multiply.source(), op_add.source(), op_select.source()];
    let key = shaders::specialisation_key("vxm", T::DTYPE, &sources);
    let module = ctx.pipelines.get_or_compile(&key, || {
        shaders::generate_vxm_shader(T::DTYPE, sources[0], sources[1], sources[2])
    })?;
    let layout = ctx.pipelines.get_or_create_layout(LayoutKey {
        num_storage_buffers: 6,
    });
    let prepare = ctx
        .pipelines
        .get_or_create_pipeline(&key, "vxm_prepare", &module, &layout)?;

    let avg_row = m_acc.nnz / m_acc.n_rows.max(1);
    let (entry, exec_groups) = if avg_row >= 32 {
        ("vxm_atomic_vector", v_acc.len.clamp(1, MAX_GROUPS))
    } else {
        ("vxm_atomic_scalar", workgroup_count(v_acc.len))
    };
    let exec = ctx
        .pipelines
        .get_or_create_pipeline(&key, entry, &module, &layout)?;

    let params = VxmParams {
        n_rows: v_acc.len,
        n_cols: r_acc.len,
        early_exit: desc.early_exit as u32,
        init_bits: init.to_bits_u32(),
        fill_v_bits: v_st.fill_value().to_bits_u32(),
        pad0: 0,
        pad1: 0,
        pad2: 0,
    };
    let params_buf =
        ctx.create_uniform_buffer("graphr vxm params", std::mem::size_of::<VxmParams>() as u64);
    ctx.write_buffer(&params_buf, &[params]);

    let bind = ctx.pipelines.create_bind_group(
        &layout,
        &[
            &v_acc.ax,
            &m_acc.ap,
            &m_acc.aj,
            &m_acc.ax,
            &mask_acc.ax,
            &r_acc.ax,
            &params_buf,
        ],
    );

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("graphr vxm"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("vxm"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&prepare);
        pass.set_bind_group(0, &bind, &[]);
        pass.dispatch_workgroups(workgroup_count(r_acc.len), 1, 1);
        pass.set_pipeline(&exec);
        pass.dispatch_workgroups(exec_groups, 1, 1);
    }
    ctx.submit_and_wait(encoder)
}
