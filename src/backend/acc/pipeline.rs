//! Compute pipeline cache
//!
//! Shader modules and pipelines are cached by specialisation key (the
//! kernel family plus a hash of the substituted operator sources), so a
//! semiring's first dispatch compiles once and later dispatches reuse
//! the pipeline. Compilation failures are surfaced as errors and left
//! uncached, letting a later dispatch retry.
//!
//! Bind group layouts are uniform across kernels: N read-write storage
//! buffers followed by one uniform parameter buffer. Shaders declare
//! every storage binding `read_write` to match.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingType, Buffer, BufferBindingType, ComputePipeline,
    ComputePipelineDescriptor, Device, PipelineLayoutDescriptor, ShaderModule,
    ShaderModuleDescriptor, ShaderSource, ShaderStages,
};

/// Workgroup size shared by the one-dimensional kernels
pub const WORKGROUP_SIZE: u32 = 256;

/// Upper bound on dispatched workgroups; kernels grid-stride past it
pub const MAX_GROUPS: u32 = 4096;

/// Key for the bind group layout cache
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    /// Number of read-write storage buffers
    pub num_storage_buffers: u32,
}

/// Cache of compiled shader modules, layouts, and compute pipelines
pub struct PipelineCache {
    device: Arc<Device>,
    modules: Mutex<HashMap<String, Arc<ShaderModule>>>,
    pipelines: Mutex<HashMap<(String, &'static str), Arc<ComputePipeline>>>,
    layouts: Mutex<HashMap<LayoutKey, Arc<BindGroupLayout>>>,
}

impl PipelineCache {
    /// Create an empty cache for a device
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            modules: Mutex::new(HashMap::new()),
            pipelines: Mutex::new(HashMap::new()),
            layouts: Mutex::new(HashMap::new()),
        }
    }

    /// Get or compile the module for `key`, generating source on demand
    ///
    /// The generator runs only on a cache miss. A validation error
    /// during compilation is returned and nothing is cached.
    pub fn get_or_compile(
        &self,
        key: &str,
        generate: impl FnOnce() -> Result<String>,
    ) -> Result<Arc<ShaderModule>> {
        if let Some(module) = self.modules.lock().get(key) {
            return Ok(module.clone());
        }

        let source = generate()?;

        let error_scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(key),
            source: ShaderSource::Wgsl(source.into()),
        });
        let compile_error = pollster::block_on(error_scope.pop());
        if let Some(e) = compile_error {
            return Err(Error::Compilation(e.to_string()));
        }

        let module = Arc::new(module);
        self.modules.lock().insert(key.to_string(), module.clone());
        Ok(module)
    }

    /// Get or create the bind group layout for `key`
    pub fn get_or_create_layout(&self, key: LayoutKey) -> Arc<BindGroupLayout> {
        let mut layouts = self.layouts.lock();
        if let Some(layout) = layouts.get(&key) {
            return layout.clone();
        }

        let mut entries = Vec::new();
        for i in 0..key.num_storage_buffers {
            entries.push(BindGroupLayoutEntry {
                binding: i,
                visibility: ShaderStages::COMPUTE,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }
        entries.push(BindGroupLayoutEntry {
            binding: key.num_storage_buffers,
            visibility: ShaderStages::COMPUTE,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });

        let layout = Arc::new(self.device.create_bind_group_layout(
            &BindGroupLayoutDescriptor {
                label: Some("graphr kernel layout"),
                entries: &entries,
            },
        ));
        layouts.insert(key, layout.clone());
        layout
    }

    /// Get or create the pipeline for `(key, entry_point)`
    pub fn get_or_create_pipeline(
        &self,
        key: &str,
        entry_point: &'static str,
        module: &ShaderModule,
        layout: &BindGroupLayout,
    ) -> Result<Arc<ComputePipeline>> {
        let cache_key = (key.to_string(), entry_point);
        if let Some(pipeline) = self.pipelines.lock().get(&cache_key) {
            return Ok(pipeline.clone());
        }

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{key}_layout")),
                bind_group_layouts: &[layout],
                immediate_size: 0,
            });

        let error_scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_compute_pipeline(&ComputePipelineDescriptor {
                label: Some(&format!("{key}_{entry_point}")),
                layout: Some(&pipeline_layout),
                module,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            });
        let create_error = pollster::block_on(error_scope.pop());
        if let Some(e) = create_error {
            return Err(Error::Compilation(e.to_string()));
        }

        let pipeline = Arc::new(pipeline);
        self.pipelines.lock().insert(cache_key, pipeline.clone());
        Ok(pipeline)
    }

    /// Create a bind group pairing `buffers` (storage then uniform) with
    /// the uniform layout of the same arity
    pub fn create_bind_group(&self, layout: &BindGroupLayout, buffers: &[&Buffer]) -> BindGroup {
        let entries: Vec<BindGroupEntry> = buffers
            .iter()
            .enumerate()
            .map(|(i, buffer)| BindGroupEntry {
                binding: i as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        self.device.create_bind_group(&BindGroupDescriptor {
            label: Some("graphr bind group"),
            layout,
            entries: &entries,
        })
    }
}

/// Workgroups covering `n` items, clamped for grid-stride kernels
#[inline]
pub fn workgroup_count(n: u32) -> u32 {
    n.div_ceil(WORKGROUP_SIZE).clamp(1, MAX_GROUPS)
}
