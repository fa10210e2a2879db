//! WebGPU accelerator backend
//!
//! The accelerator context is a process-wide singleton initialised on
//! first use. Adapter selection follows a fixed policy: the first GPU
//! adapter wins, a CPU adapter is the fallback, and when nothing is
//! available the backend simply does not register and dispatch stays on
//! host kernels.
//!
//! Kernels are WGSL compute shaders generated per (element type,
//! operator set) by textual substitution of the operators' source
//! snippets; compiled pipelines are cached by specialisation key. A
//! failed compilation is reported and not cached, so a later dispatch
//! retries.

mod assign;
pub mod block;
mod ewise;
mod map;
mod pipeline;
mod reduce;
mod shaders;
mod vxm;

use crate::dispatch::AlgorithmRegistry;
use crate::dtype::Element;
use crate::error::{Error, Result};
use bytemuck::Zeroable;
use pipeline::PipelineCache;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use wgpu::{Buffer, BufferDescriptor, BufferUsages, Device, Queue};

/// Register every accelerator algorithm, ahead of the host entries
pub fn register<T: Element>(reg: &mut AlgorithmRegistry<T>) {
    reg.add(Arc::new(vxm::VxmMaskedAcc));
    reg.add(Arc::new(assign::VAssignMaskedAcc));
    reg.add(Arc::new(reduce::VReduceAcc));
    reg.add(Arc::new(map::VMapAcc));
    reg.add(Arc::new(ewise::VEwiseAddMaskedAcc));
}

/// Process-wide accelerator context: device, queue, pipeline cache
pub struct AccContext {
    pub(crate) device: Arc<Device>,
    pub(crate) queue: Arc<Queue>,
    pub(crate) pipelines: PipelineCache,
    adapter_name: String,
}

static CONTEXT: OnceLock<Option<Arc<AccContext>>> = OnceLock::new();

/// The accelerator context, or an error when no adapter exists
pub fn context() -> Result<Arc<AccContext>> {
    CONTEXT
        .get_or_init(|| AccContext::init().map(Arc::new))
        .clone()
        .ok_or_else(|| Error::invalid_state("no accelerator adapter available"))
}

/// True when an accelerator adapter was found and initialised
pub fn is_available() -> bool {
    context().is_ok()
}

impl AccContext {
    fn init() -> Option<Self> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> Option<Self> {
        let instance = wgpu::Instance::default();
        let mut adapters = instance.enumerate_adapters(wgpu::Backends::all()).await;
        if adapters.is_empty() {
            return None;
        }

        // first GPU preferred, first CPU adapter otherwise
        let gpu = adapters.iter().position(|a| {
            matches!(
                a.get_info().device_type,
                wgpu::DeviceType::DiscreteGpu
                    | wgpu::DeviceType::IntegratedGpu
                    | wgpu::DeviceType::VirtualGpu
            )
        });
        let adapter = adapters.swap_remove(gpu.unwrap_or(0));
        let adapter_name = adapter.get_info().name.clone();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("graphr device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await
            .ok()?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);
        let pipelines = PipelineCache::new(device.clone());

        Some(Self {
            device,
            queue,
            pipelines,
            adapter_name,
        })
    }

    /// Name of the selected adapter
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Create a storage buffer of at least `size` bytes (padded so empty
    /// containers still bind)
    pub(crate) fn create_storage_buffer(&self, label: &str, size: u64) -> Buffer {
        let padded = size.max(4).div_ceil(4) * 4;
        self.device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size: padded,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    /// Create a staging buffer for device-to-host readback
    pub(crate) fn create_staging_buffer(&self, label: &str, size: u64) -> Buffer {
        self.device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size: size.max(4).div_ceil(4) * 4,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create a uniform buffer for kernel parameters
    pub(crate) fn create_uniform_buffer(&self, label: &str, size: u64) -> Buffer {
        self.device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size: size.max(16),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Write host data into a device buffer
    pub(crate) fn write_buffer<P: bytemuck::Pod>(&self, buffer: &Buffer, data: &[P]) {
        if !data.is_empty() && std::mem::size_of::<P>() > 0 {
            self.queue.write_buffer(buffer, 0, bytemuck::cast_slice(data));
        }
    }

    /// Submit recorded commands and block until the queue drains
    pub(crate) fn submit_and_wait(&self, encoder: wgpu::CommandEncoder) -> Result<()> {
        let submission = self.queue.submit(std::iter::once(encoder.finish()));
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: Some(Duration::from_secs(60)),
            })
            .map(|_| ())
            .map_err(|e| Error::Execution(format!("queue wait failed: {e:?}")))
    }

    /// Read a mapped staging buffer back into host memory
    pub(crate) fn read_buffer<P: bytemuck::Pod>(
        &self,
        staging: &Buffer,
        output: &mut [P],
    ) -> Result<()> {
        if output.is_empty() || std::mem::size_of::<P>() == 0 {
            return Ok(());
        }
        let slice = staging.slice(..);

        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(60)),
            })
            .map_err(|e| Error::Execution(format!("device poll failed: {e:?}")))?;

        receiver
            .recv()
            .map_err(|_| Error::Execution("map_async callback never ran".into()))?
            .map_err(|e| Error::Execution(format!("buffer map failed: {e:?}")))?;

        {
            let data = slice.get_mapped_range();
            let src: &[P] = bytemuck::cast_slice(&data);
            output.copy_from_slice(&src[..output.len()]);
        }
        staging.unmap();
        Ok(())
    }

    /// Copy a storage buffer into a fresh staging buffer and read it back
    pub(crate) fn download<P: bytemuck::Pod>(
        &self,
        src: &Buffer,
        count: usize,
    ) -> Result<Vec<P>> {
        let mut out = vec![P::zeroed(); count];
        if count == 0 || std::mem::size_of::<P>() == 0 {
            return Ok(out);
        }
        let bytes = (count * std::mem::size_of::<P>()) as u64;
        let staging = self.create_staging_buffer("graphr staging", bytes);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("graphr download"),
            });
        encoder.copy_buffer_to_buffer(src, 0, &staging, 0, bytes);
        self.submit_and_wait(encoder)?;
        self.read_buffer(&staging, &mut out)?;
        Ok(out)
    }
}
