use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::layout::{BufferLayout, ComponentType, StepRate};

use super::surface::SurfaceTarget;
use super::{
    BindGroupEntry, BindGroupHandle, BufferHandle, BufferUsage, CommandRecorder, DeviceError,
    GpuInit, GraphicsDevice, ImageViewHandle, PipelineDesc, PipelineHandle, Presentation,
    RenderCommand, ShaderHandle, SurfaceErrorAction,
};

/// Surface texture acquired for the frame in flight.
struct AcquiredFrame {
    handle: ImageViewHandle,
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// wgpu device bound to one window surface.
///
/// Resources live in plain vectors indexed by their handles and are never
/// freed individually; they go away with the `Gpu`.
pub struct Gpu<'w> {
    target: SurfaceTarget<'w>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Set by the device-lost callback or a fatal surface error.
    lost: Arc<AtomicBool>,

    frame_counter: u32,
    pending: Option<AcquiredFrame>,

    buffers: Vec<wgpu::Buffer>,
    shaders: Vec<wgpu::ShaderModule>,
    pipelines: Vec<wgpu::RenderPipeline>,
    bind_groups: Vec<wgpu::BindGroup>,
}

impl<'w> Gpu<'w> {
    /// Creates the device and configures the window surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("annulus-engine device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            log::error!("device lost ({reason:?}): {message}");
            lost_flag.store(true, Ordering::Release);
        });

        let target = SurfaceTarget::new(surface, &adapter, &device, size, &init)?;

        Ok(Gpu {
            target,
            adapter,
            device,
            queue,
            lost,
            frame_counter: 0,
            pending: None,
            buffers: Vec::new(),
            shaders: Vec::new(),
            pipelines: Vec::new(),
            bind_groups: Vec::new(),
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.target.format()
    }

    /// Current drawable size in physical pixels.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.target.size()
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Reconfigures the surface and depth attachment after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.target.resize(&self.device, new_size);
    }

    fn ensure_available(&self) -> Result<(), DeviceError> {
        if self.lost.load(Ordering::Acquire) {
            return Err(DeviceError::Unavailable("wgpu device lost".to_string()));
        }
        Ok(())
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&wgpu::Buffer, DeviceError> {
        self.buffers
            .get(handle.index())
            .ok_or(DeviceError::InvalidHandle { kind: "buffer", index: handle.0 })
    }

    fn pipeline(&self, handle: PipelineHandle) -> Result<&wgpu::RenderPipeline, DeviceError> {
        self.pipelines
            .get(handle.index())
            .ok_or(DeviceError::InvalidHandle { kind: "pipeline", index: handle.0 })
    }

    fn bind_group(&self, handle: BindGroupHandle) -> Result<&wgpu::BindGroup, DeviceError> {
        self.bind_groups
            .get(handle.index())
            .ok_or(DeviceError::InvalidHandle { kind: "bind group", index: handle.0 })
    }

    fn replay(
        &self,
        rpass: &mut wgpu::RenderPass<'_>,
        commands: &[RenderCommand],
    ) -> Result<(), DeviceError> {
        for command in commands {
            match *command {
                RenderCommand::SetPipeline(p) => rpass.set_pipeline(self.pipeline(p)?),
                RenderCommand::SetVertexBuffer { slot, buffer } => {
                    rpass.set_vertex_buffer(slot, self.buffer(buffer)?.slice(..));
                }
                RenderCommand::SetIndexBuffer(buffer) => {
                    rpass.set_index_buffer(self.buffer(buffer)?.slice(..), wgpu::IndexFormat::Uint32);
                }
                RenderCommand::SetBindGroup { index, group } => {
                    rpass.set_bind_group(index, self.bind_group(group)?, &[]);
                }
                RenderCommand::Draw { vertices, instances } => {
                    rpass.draw(0..vertices, 0..instances);
                }
                RenderCommand::DrawIndexed { indices, instances } => {
                    rpass.draw_indexed(0..indices, 0, 0..instances);
                }
            }
        }
        Ok(())
    }
}

impl GraphicsDevice for Gpu<'_> {
    fn is_available(&self) -> bool {
        !self.lost.load(Ordering::Acquire)
    }

    fn create_buffer(
        &mut self,
        size: u64,
        usage: BufferUsage,
        label: &str,
    ) -> Result<BufferHandle, DeviceError> {
        self.ensure_available()?;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: map_usage(usage),
            mapped_at_creation: false,
        });
        self.buffers.push(buffer);
        Ok(BufferHandle(self.buffers.len() as u32 - 1))
    }

    fn write_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        self.ensure_available()?;
        let target = self.buffer(buffer)?;
        let len = bytes.len() as u64;
        if offset + len > target.size() {
            return Err(DeviceError::OutOfRange { offset, len, size: target.size() });
        }
        self.queue.write_buffer(target, offset, bytes);
        Ok(())
    }

    fn create_shader(&mut self, label: &str, wgsl: &str) -> Result<ShaderHandle, DeviceError> {
        self.ensure_available()?;
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        });
        self.shaders.push(module);
        Ok(ShaderHandle(self.shaders.len() as u32 - 1))
    }

    fn create_render_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle, DeviceError> {
        self.ensure_available()?;
        let shader = self
            .shaders
            .get(desc.shader.index())
            .ok_or(DeviceError::InvalidHandle { kind: "shader", index: desc.shader.0 })?;

        let attributes = desc
            .vertex_buffers
            .iter()
            .map(vertex_attributes)
            .collect::<Result<Vec<_>, _>>()?;
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = desc
            .vertex_buffers
            .iter()
            .zip(&attributes)
            .map(|(layout, attrs)| wgpu::VertexBufferLayout {
                array_stride: layout.stride as u64,
                step_mode: match layout.step {
                    StepRate::Instance => wgpu::VertexStepMode::Instance,
                    _ => wgpu::VertexStepMode::Vertex,
                },
                attributes: attrs,
            })
            .collect();

        // Every frame pass carries the depth attachment, so every pipeline
        // declares it; untested pipelines just never reject a fragment.
        let depth_stencil = wgpu::DepthStencilState {
            format: self.target.depth_format(),
            depth_write_enabled: desc.depth_test,
            depth_compare: if desc.depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&desc.label),
            layout: None,
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(&desc.vertex_entry),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(&desc.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.target.format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(depth_stencil),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("created pipeline `{}`", desc.label);
        self.pipelines.push(pipeline);
        Ok(PipelineHandle(self.pipelines.len() as u32 - 1))
    }

    fn create_bind_group(
        &mut self,
        pipeline: PipelineHandle,
        group: u32,
        entries: &[BindGroupEntry],
    ) -> Result<BindGroupHandle, DeviceError> {
        self.ensure_available()?;
        let layout = self.pipeline(pipeline)?.get_bind_group_layout(group);
        let entries = entries
            .iter()
            .map(|e| {
                Ok(wgpu::BindGroupEntry {
                    binding: e.binding,
                    resource: self.buffer(e.buffer)?.as_entire_binding(),
                })
            })
            .collect::<Result<Vec<_>, DeviceError>>()?;

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("annulus bind group"),
            layout: &layout,
            entries: &entries,
        });
        self.bind_groups.push(bind_group);
        Ok(BindGroupHandle(self.bind_groups.len() as u32 - 1))
    }

    fn begin_frame(
        &mut self,
        target: ImageViewHandle,
        clear: [f32; 4],
    ) -> Result<CommandRecorder, DeviceError> {
        self.ensure_available()?;
        match &self.pending {
            Some(frame) if frame.handle == target => Ok(CommandRecorder::new(target, clear)),
            _ => Err(DeviceError::InvalidHandle { kind: "image view", index: target.0 }),
        }
    }

    fn submit(&mut self, recorder: CommandRecorder) -> Result<(), DeviceError> {
        self.ensure_available()?;
        let target = recorder.target();
        let frame = self
            .pending
            .take()
            .filter(|f| f.handle == target)
            .ok_or(DeviceError::InvalidHandle { kind: "image view", index: target.0 })?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("annulus frame encoder"),
            });

        {
            let [r, g, b, a] = recorder.clear_color();
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("annulus frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            self.replay(&mut rpass, recorder.commands())?;
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();
        Ok(())
    }
}

impl Presentation for Gpu<'_> {
    fn current_frame_target(&mut self) -> Result<ImageViewHandle, DeviceError> {
        self.ensure_available()?;
        // An unsubmitted frame from a failed attempt is released here.
        self.pending = None;

        let surface_texture = match self.target.acquire(&self.device) {
            Ok(texture) => texture,
            Err((SurfaceErrorAction::Fatal, message)) => {
                self.lost.store(true, Ordering::Release);
                return Err(DeviceError::Unavailable(message));
            }
            Err((action, message)) => {
                log::debug!("skipping frame ({action:?}): {message}");
                return Err(DeviceError::FrameSkipped(message));
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let handle = ImageViewHandle(self.frame_counter);
        self.frame_counter = self.frame_counter.wrapping_add(1);
        self.pending = Some(AcquiredFrame { handle, surface_texture, view });
        Ok(handle)
    }
}

fn map_usage(usage: BufferUsage) -> wgpu::BufferUsages {
    let mut out = wgpu::BufferUsages::empty();
    for (ours, theirs) in [
        (BufferUsage::VERTEX, wgpu::BufferUsages::VERTEX),
        (BufferUsage::INDEX, wgpu::BufferUsages::INDEX),
        (BufferUsage::UNIFORM, wgpu::BufferUsages::UNIFORM),
        (BufferUsage::STORAGE, wgpu::BufferUsages::STORAGE),
        (BufferUsage::COPY_DST, wgpu::BufferUsages::COPY_DST),
    ] {
        if usage.contains(ours) {
            out |= theirs;
        }
    }
    out
}

fn vertex_attributes(layout: &BufferLayout) -> Result<Vec<wgpu::VertexAttribute>, DeviceError> {
    if !layout.step.is_stepped() {
        return Err(DeviceError::Backend(format!(
            "buffer {} is a resource buffer, not a vertex buffer",
            layout.index
        )));
    }

    layout
        .fields
        .iter()
        .map(|field| {
            let format = vertex_format(field.ty, field.components).ok_or_else(|| {
                DeviceError::Backend(format!(
                    "no vertex format for `{}` ({:?} x{})",
                    field.name, field.ty, field.components
                ))
            })?;
            Ok(wgpu::VertexAttribute {
                format,
                offset: field.offset as u64,
                shader_location: field.location,
            })
        })
        .collect()
}

fn vertex_format(ty: ComponentType, components: u32) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    Some(match (ty, components) {
        (ComponentType::Float32, 1) => F::Float32,
        (ComponentType::Float32, 2) => F::Float32x2,
        (ComponentType::Float32, 3) => F::Float32x3,
        (ComponentType::Float32, 4) => F::Float32x4,
        (ComponentType::Uint32, 1) => F::Uint32,
        (ComponentType::Uint32, 2) => F::Uint32x2,
        (ComponentType::Uint32, 3) => F::Uint32x3,
        (ComponentType::Uint32, 4) => F::Uint32x4,
        (ComponentType::Sint32, 1) => F::Sint32,
        (ComponentType::Sint32, 2) => F::Sint32x2,
        (ComponentType::Sint32, 3) => F::Sint32x3,
        (ComponentType::Sint32, 4) => F::Sint32x4,
        (ComponentType::Unorm8, 4) => F::Unorm8x4,
        _ => return None,
    })
}
