//! wgpu backend: orb line pipelines, mesh buffers, and the bloom chain.

use glam::{Mat4, Vec3};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

use super::bloom::{BloomChain, HDR_FORMAT};
use super::{CompositeLayout, FrameInput, FrameRenderer, OrbUniforms};
use crate::error::RenderError;
use crate::orb::{BackdropOrb, OrbMesh, Vertex};
use crate::params::{BloomConfig, RenderConfig};

/// GPU buffers for one wireframe mesh
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    edge_buffer: wgpu::Buffer,
    edge_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl MeshBuffers {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        mesh: &OrbMesh,
        color: [f32; 4],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let edge_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Edge Buffer")),
            contents: bytemuck::cast_slice(&mesh.edge_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniforms = OrbUniforms {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color,
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Uniform Buffer")),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Bind Group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            vertex_buffer,
            edge_buffer,
            edge_count: mesh.edge_indices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.edge_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.edge_count, 0, 0..1);
    }
}

/// Rendering system managing the wgpu device, pipelines, and buffers
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    clear_color: wgpu::Color,
    orb_color: [f32; 4],
    backdrop_color: [f32; 4],
    scene_pipeline: wgpu::RenderPipeline,
    backdrop_pipeline: wgpu::RenderPipeline,
    orb: MeshBuffers,
    backdrop: MeshBuffers,
    bloom: BloomChain,
}

impl GpuRenderer {
    /// Create the renderer for `window`, uploading both orb meshes
    pub async fn new(
        window: Arc<winit::window::Window>,
        layout: &CompositeLayout,
        render_config: &RenderConfig,
        bloom_config: &BloomConfig,
        orb_mesh: &OrbMesh,
        backdrop: &BackdropOrb,
    ) -> Result<Self, RenderError> {
        let (width, height) = layout.surface;

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        info!(adapter = %adapter.get_info().name, "GPU adapter selected");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Orb Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/orb.wgsl").into()),
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Orb Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Orb Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Same line shader, one pipeline per target format
        let scene_pipeline =
            line_pipeline(&device, &pipeline_layout, &shader, "Orb Scene Pipeline", HDR_FORMAT);
        let backdrop_pipeline = line_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            "Backdrop Pipeline",
            surface_format,
        );

        // Lambert-style flat shading under ambient light only
        let lit = Vec3::from_array(render_config.orb_color)
            * Vec3::from_array(render_config.ambient_light);
        let orb_color = lit.extend(1.0).to_array();

        let orb = MeshBuffers::new(
            &device,
            &uniform_bind_group_layout,
            "Orb",
            orb_mesh,
            orb_color,
        );
        let backdrop_buffers = MeshBuffers::new(
            &device,
            &uniform_bind_group_layout,
            "Backdrop",
            &backdrop.mesh,
            backdrop.color,
        );

        let bloom = BloomChain::new(&device, surface_format, bloom_config, layout);

        let [r, g, b, a] = render_config.clear_color;
        debug!(?surface_format, width, height, "renderer initialised");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            clear_color: wgpu::Color { r, g, b, a },
            orb_color,
            backdrop_color: backdrop.color,
            scene_pipeline,
            backdrop_pipeline,
            orb,
            backdrop: backdrop_buffers,
            bloom,
        })
    }

    fn write_uniforms(&self, buffers: &MeshBuffers, view_proj: Mat4, model: Mat4, color: [f32; 4]) {
        let uniforms = OrbUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color,
        };
        self.queue
            .write_buffer(&buffers.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Upload rewritten orb vertices
    fn update_vertices(&self, vertices: &[Vertex]) {
        self.queue
            .write_buffer(&self.orb.vertex_buffer, 0, bytemuck::cast_slice(vertices));
    }
}

impl FrameRenderer for GpuRenderer {
    fn resize(&mut self, layout: &CompositeLayout) {
        let (width, height) = layout.surface;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.bloom.resize(&self.device, &self.queue, layout);
    }

    fn render(&mut self, frame: &FrameInput<'_>) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Skip this frame; the next one draws to the fresh swapchain
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timed out, dropping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(orb) = &frame.orb {
            if let Some(vertices) = orb.vertices {
                self.update_vertices(vertices);
            }
            self.write_uniforms(&self.orb, frame.view_proj, orb.model, self.orb_color);
        }
        self.write_uniforms(
            &self.backdrop,
            frame.view_proj,
            frame.backdrop_model,
            self.backdrop_color,
        );

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Orb into the offscreen scene target
        {
            let mut scene_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.bloom.scene_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if frame.orb.is_some() {
                scene_pass.set_pipeline(&self.scene_pipeline);
                self.orb.draw(&mut scene_pass);
            }
        }

        self.bloom.encode_blur(&mut encoder);

        // Backdrop directly on the surface, then scene + glow added on top
        {
            let mut surface_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Surface Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            surface_pass.set_pipeline(&self.backdrop_pipeline);
            self.backdrop.draw(&mut surface_pass);

            self.bloom.draw_composite(&mut surface_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn line_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                }],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
