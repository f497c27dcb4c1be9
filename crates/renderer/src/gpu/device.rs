use std::borrow::Cow;
use std::mem::size_of;
use std::sync::Arc;

use tracing::warn;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{FrameStatus, GraphicsDevice, StageKind, Viewport};
use crate::error::RendererError;
use crate::types::GpuPowerPreference;
use crate::uniforms::{FrameUniforms, POSITION_LOCATION, UNIFORM_BINDING};

use super::context::GpuContext;

pub struct WgpuStage {
    module: wgpu::ShaderModule,
    kind: StageKind,
}

pub struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
}

/// Commands collected between `begin_frame` and `end_frame`, encoded as one
/// render pass on submit.
struct PendingFrame {
    target: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    clear: wgpu::Color,
    pipeline: Option<(wgpu::RenderPipeline, wgpu::BindGroup)>,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: Option<u32>,
}

/// [`GraphicsDevice`] backed by a wgpu surface.
pub struct WgpuDevice {
    context: GpuContext,
    uniform_layout: wgpu::BindGroupLayout,
    viewport: Viewport,
    frame: Option<PendingFrame>,
}

impl WgpuDevice {
    pub fn new(
        window: Arc<Window>,
        initial_size: PhysicalSize<u32>,
        gpu_power: GpuPowerPreference,
        vsync: bool,
    ) -> Result<Self, RendererError> {
        let context = GpuContext::new(window, initial_size, gpu_power, vsync)?;
        let uniform_layout =
            context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("field uniform layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: UNIFORM_BINDING,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                size_of::<FrameUniforms>() as u64,
                            ),
                        },
                        count: None,
                    }],
                });
        let viewport = Viewport::covering(context.size);
        Ok(Self {
            context,
            uniform_layout,
            viewport,
            frame: None,
        })
    }

    fn with_error_scope<T>(
        &self,
        filter: wgpu::ErrorFilter,
        create: impl FnOnce(&wgpu::Device) -> T,
    ) -> (T, Option<wgpu::Error>) {
        let device = &self.context.device;
        device.push_error_scope(filter);
        let value = create(device);
        let error = pollster::block_on(device.pop_error_scope());
        (value, error)
    }
}

impl GraphicsDevice for WgpuDevice {
    type Stage = WgpuStage;
    type Program = WgpuProgram;
    type Buffer = WgpuBuffer;

    fn backing_size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    fn configure_backing(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn compile_stage(&mut self, kind: StageKind, source: &str) -> Result<WgpuStage, RendererError> {
        let (module, error) = self.with_error_scope(wgpu::ErrorFilter::Validation, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match kind {
                    StageKind::Vertex => "field vertex",
                    StageKind::Fragment => "field fragment",
                }),
                source: wgpu::ShaderSource::Glsl {
                    shader: Cow::Owned(source.to_owned()),
                    stage: kind.naga_stage(),
                    defines: &[],
                },
            })
        });

        let info = pollster::block_on(module.get_compilation_info());
        let mut diagnostics: Vec<String> = info
            .messages
            .iter()
            .filter(|message| matches!(message.message_type, wgpu::CompilationMessageType::Error))
            .map(|message| match &message.location {
                Some(location) => format!(
                    "{}:{}: {}",
                    location.line_number, location.line_position, message.message
                ),
                None => message.message.clone(),
            })
            .collect();
        if let Some(error) = error {
            diagnostics.push(error.to_string());
        }
        if !diagnostics.is_empty() {
            return Err(RendererError::Compile {
                stage: kind,
                diagnostics: diagnostics.join("\n"),
            });
        }
        Ok(WgpuStage { module, kind })
    }

    fn link_program(
        &mut self,
        vertex: &WgpuStage,
        fragment: &WgpuStage,
    ) -> Result<WgpuProgram, RendererError> {
        if vertex.kind != StageKind::Vertex || fragment.kind != StageKind::Fragment {
            return Err(RendererError::Link {
                diagnostics: format!(
                    "expected vertex and fragment stages, got {} and {}",
                    vertex.kind, fragment.kind
                ),
            });
        }

        let format = self.context.format();
        let layout = &self.uniform_layout;
        let (pipeline, error) = self.with_error_scope(wgpu::ErrorFilter::Validation, |device| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("field pipeline layout"),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("field pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex.module,
                    entry_point: Some("main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: size_of::<[f32; 2]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 0,
                            shader_location: POSITION_LOCATION,
                        }],
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment.module,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            })
        });
        if let Some(error) = error {
            return Err(RendererError::Link {
                diagnostics: error.to_string(),
            });
        }

        let (uniform_buffer, error) =
            self.with_error_scope(wgpu::ErrorFilter::OutOfMemory, |device| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("field uniforms"),
                    size: size_of::<FrameUniforms>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            });
        if let Some(error) = error {
            return Err(RendererError::ResourceAcquisition(error.to_string()));
        }

        let bind_group = self
            .context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("field uniform bind group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        Ok(WgpuProgram {
            pipeline,
            uniform_buffer,
            bind_group,
        })
    }

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[[f32; 2]],
    ) -> Result<WgpuBuffer, RendererError> {
        let (buffer, error) = self.with_error_scope(wgpu::ErrorFilter::OutOfMemory, |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
        match error {
            Some(error) => Err(RendererError::ResourceAcquisition(error.to_string())),
            None => Ok(WgpuBuffer { buffer }),
        }
    }

    fn write_uniforms(&mut self, program: &WgpuProgram, uniforms: &FrameUniforms) {
        self.context
            .queue
            .write_buffer(&program.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    fn begin_frame(&mut self, clear: [f64; 4]) -> Result<FrameStatus, RendererError> {
        let target = match self.context.surface.get_current_texture() {
            Ok(target) => target,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("timed out acquiring surface texture; skipping frame");
                return Ok(FrameStatus::Skipped);
            }
            Err(err) => return Err(RendererError::Frame(err.to_string())),
        };
        let view = target
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(PendingFrame {
            target,
            view,
            clear: wgpu::Color {
                r: clear[0],
                g: clear[1],
                b: clear[2],
                a: clear[3],
            },
            pipeline: None,
            vertex_buffer: None,
            vertex_count: None,
        });
        Ok(FrameStatus::Ready)
    }

    fn use_program(&mut self, program: &WgpuProgram) {
        if let Some(frame) = self.frame.as_mut() {
            frame.pipeline = Some((program.pipeline.clone(), program.bind_group.clone()));
        }
    }

    fn bind_vertex_buffer(&mut self, buffer: &WgpuBuffer) {
        if let Some(frame) = self.frame.as_mut() {
            frame.vertex_buffer = Some(buffer.buffer.clone());
        }
    }

    fn draw(&mut self, vertex_count: u32) {
        if let Some(frame) = self.frame.as_mut() {
            frame.vertex_count = Some(vertex_count);
        }
    }

    fn end_frame(&mut self) -> Result<(), RendererError> {
        let Some(frame) = self.frame.take() else {
            return Err(RendererError::Frame(
                "end_frame called without a frame in flight".to_string(),
            ));
        };

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("field encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("field pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let (Some((pipeline, bind_group)), Some(vertex_buffer), Some(vertex_count)) =
                (&frame.pipeline, &frame.vertex_buffer, frame.vertex_count)
            {
                let Viewport {
                    x,
                    y,
                    width,
                    height,
                } = self.viewport;
                let size = self.context.size;
                render_pass.set_viewport(
                    x as f32,
                    y as f32,
                    width.min(size.width) as f32,
                    height.min(size.height) as f32,
                    0.0,
                    1.0,
                );
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                render_pass.draw(0..vertex_count, 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.target.present();
        Ok(())
    }

    fn release_program(&mut self, program: WgpuProgram) {
        program.uniform_buffer.destroy();
    }

    fn release_stage(&mut self, stage: WgpuStage) {
        drop(stage);
    }

    fn release_buffer(&mut self, buffer: WgpuBuffer) {
        buffer.buffer.destroy();
    }
}
