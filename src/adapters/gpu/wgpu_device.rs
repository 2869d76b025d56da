//! Hardware compute device on top of wgpu.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::controllers::interactive::data::gpu_params::{GPU_PARAMS_SIZE, GpuParams};
use crate::controllers::interactive::ports::gpu_device::{GpuCapability, GpuDevice, GpuError};

const KERNEL_WGSL: &str = include_str!("kernel.wgsl");
const WORKGROUP_SIZE: u32 = 16;

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    limits: wgpu::Limits,
    lost: Arc<AtomicBool>,
}

impl WgpuDevice {
    /// Picks a high-performance adapter and compiles the kernel. Any failure
    /// is `Unavailable`, so callers fall back to the worker pool.
    pub fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| GpuError::Unavailable(format!("wgpu request_adapter failed: {e:?}")))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("fractal_compute_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| GpuError::Unavailable(format!("wgpu request_device failed: {e:?}")))?;

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            warn!(?reason, %message, "wgpu device lost");
            lost_flag.store(true, Ordering::SeqCst);
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fractal_kernel"),
            source: wgpu::ShaderSource::Wgsl(KERNEL_WGSL.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fractal_kernel_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(GPU_PARAMS_SIZE as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fractal_kernel_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fractal_kernel_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::Unavailable(format!("kernel compilation failed: {err}")));
        }

        let limits = device.limits();
        info!(
            adapter = %adapter.get_info().name,
            max_storage_bytes = limits.max_storage_buffer_binding_size,
            "wgpu compute device ready"
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            layout,
            limits,
            lost,
        })
    }

    fn read_back(&self, staging: &wgpu::Buffer) -> Result<Vec<u8>, GpuError> {
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });

        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::DeviceLost(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| GpuError::DeviceLost("readback channel closed".to_string()))?
            .map_err(|e| GpuError::Dispatch(format!("readback map failed: {e:?}")))?;

        let data = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(data)
    }
}

impl GpuDevice for WgpuDevice {
    fn probe(&self) -> GpuCapability {
        GpuCapability {
            available: !self.lost.load(Ordering::SeqCst),
        }
    }

    fn dispatch(&self, params: &GpuParams) -> Result<Vec<u8>, GpuError> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(GpuError::DeviceLost("device lost before dispatch".to_string()));
        }
        if params.pixel_count() == 0 {
            return Err(GpuError::Dispatch("empty surface".to_string()));
        }

        let output_size = check_surface_limits(&self.limits, params.width, params.height)?;
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniforms = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractal_params"),
            size: GPU_PARAMS_SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue.write_buffer(&uniforms, 0, &params.to_bytes());

        let output = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractal_output"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractal_readback"),
            size: output_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fractal_bind_group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fractal_dispatch_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("fractal_dispatch"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                params.width.div_ceil(WORKGROUP_SIZE),
                params.height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }
        encoder.copy_buffer_to_buffer(&output, 0, &staging, 0, output_size);
        self.queue.submit(Some(encoder.finish()));

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::Dispatch(err.to_string()));
        }

        let data = self.read_back(&staging)?;
        if self.lost.load(Ordering::SeqCst) {
            return Err(GpuError::DeviceLost("device lost during dispatch".to_string()));
        }

        debug!(width = params.width, height = params.height, "wgpu dispatch finished");
        Ok(data)
    }
}

/// Output bytes for a `width` x `height` dispatch, or why the device cannot
/// run it in one storage binding and one workgroup grid.
fn check_surface_limits(limits: &wgpu::Limits, width: u32, height: u32) -> Result<u64, GpuError> {
    let output_size = u64::from(width) * u64::from(height) * 4;
    let max_output = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    if output_size > max_output {
        return Err(GpuError::Dispatch(format!(
            "{width}x{height} surface needs {output_size} bytes, device allows {max_output}"
        )));
    }

    let groups = width
        .div_ceil(WORKGROUP_SIZE)
        .max(height.div_ceil(WORKGROUP_SIZE));
    if groups > limits.max_compute_workgroups_per_dimension {
        return Err(GpuError::Dispatch(format!(
            "{width}x{height} surface needs {groups} workgroups per dimension, device allows {}",
            limits.max_compute_workgroups_per_dimension
        )));
    }

    Ok(output_size)
}
