//! Bloom post-processing: half-resolution extract and blur, additive composite.

use wgpu::util::DeviceExt;

use super::{BloomUniforms, CompositeLayout};
use crate::params::BloomConfig;

/// Format of the offscreen scene and bloom targets
pub(super) const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Adds the composite onto whatever is already on the surface
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, label: &str, (width, height): (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Size-dependent resources, rebuilt on resize
struct BloomTargets {
    scene: RenderTarget,
    ping: RenderTarget,
    pong: RenderTarget,
    extract: wgpu::BindGroup,
    blur_h: wgpu::BindGroup,
    blur_v: wgpu::BindGroup,
    composite: wgpu::BindGroup,
}

struct PassUniforms {
    extract: wgpu::Buffer,
    blur_h: wgpu::Buffer,
    blur_v: wgpu::Buffer,
    composite: wgpu::Buffer,
}

pub(super) struct BloomChain {
    config: BloomConfig,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    extract_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    uniforms: PassUniforms,
    targets: BloomTargets,
}

impl BloomChain {
    pub(super) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        config: &BloomConfig,
        layout: &CompositeLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/bloom.wgsl").into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Bind Group Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipeline = |label, entry_point, format, blend| {
            fullscreen_pipeline(device, &pipeline_layout, &shader, label, entry_point, format, blend)
        };
        let extract_pipeline = pipeline("Bloom Extract Pipeline", "fs_extract", HDR_FORMAT, None);
        let blur_pipeline = pipeline("Bloom Blur Pipeline", "fs_blur", HDR_FORMAT, None);
        let composite_pipeline = pipeline(
            "Bloom Composite Pipeline",
            "fs_composite",
            surface_format,
            Some(ADDITIVE),
        );

        let uniform_buffer = |label, uniforms: BloomUniforms| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let [extract, blur_h, blur_v, composite] = pass_uniforms(config, layout);
        let uniforms = PassUniforms {
            extract: uniform_buffer("Bloom Extract Uniforms", extract),
            blur_h: uniform_buffer("Bloom Blur H Uniforms", blur_h),
            blur_v: uniform_buffer("Bloom Blur V Uniforms", blur_v),
            composite: uniform_buffer("Bloom Composite Uniforms", composite),
        };

        let targets =
            Self::create_targets(device, &bind_group_layout, &sampler, &uniforms, layout);

        Self {
            config: config.clone(),
            bind_group_layout,
            sampler,
            extract_pipeline,
            blur_pipeline,
            composite_pipeline,
            uniforms,
            targets,
        }
    }

    /// Rebuild targets for a new viewport
    pub(super) fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &CompositeLayout,
    ) {
        self.targets = Self::create_targets(
            device,
            &self.bind_group_layout,
            &self.sampler,
            &self.uniforms,
            layout,
        );

        let [extract, blur_h, blur_v, composite] = pass_uniforms(&self.config, layout);
        for (buffer, uniforms) in [
            (&self.uniforms.extract, extract),
            (&self.uniforms.blur_h, blur_h),
            (&self.uniforms.blur_v, blur_v),
            (&self.uniforms.composite, composite),
        ] {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[uniforms]));
        }
    }

    /// Full-resolution target the scene is drawn into
    pub(super) fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets.scene.view
    }

    /// Extract bright pixels from the scene and blur them (ping → pong → ping)
    pub(super) fn encode_blur(&self, encoder: &mut wgpu::CommandEncoder) {
        let targets = &self.targets;
        let passes = [
            ("Bloom Extract Pass", &self.extract_pipeline, &targets.extract, &targets.ping.view),
            ("Bloom Blur H Pass", &self.blur_pipeline, &targets.blur_h, &targets.pong.view),
            ("Bloom Blur V Pass", &self.blur_pipeline, &targets.blur_v, &targets.ping.view),
        ];

        for (label, pipeline, bind_group, target) in passes {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
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
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1); // Fullscreen triangle
        }
    }

    /// Add scene plus glow onto the pass's target
    pub(super) fn draw_composite(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.composite_pipeline);
        pass.set_bind_group(0, &self.targets.composite, &[]);
        pass.draw(0..3, 0..1);
    }

    fn create_targets(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        uniforms: &PassUniforms,
        layout: &CompositeLayout,
    ) -> BloomTargets {
        let scene = RenderTarget::new(device, "Scene Target", layout.surface);
        let ping = RenderTarget::new(device, "Bloom Ping Target", layout.bloom);
        let pong = RenderTarget::new(device, "Bloom Pong Target", layout.bloom);

        let bind_group = |label, tex0: &wgpu::TextureView, tex1: &wgpu::TextureView, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(tex0),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(tex1),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: buffer.as_entire_binding(),
                    },
                ],
            })
        };

        let extract = bind_group("Bloom Extract Bind Group", &scene.view, &scene.view, &uniforms.extract);
        let blur_h = bind_group("Bloom Blur H Bind Group", &ping.view, &ping.view, &uniforms.blur_h);
        let blur_v = bind_group("Bloom Blur V Bind Group", &pong.view, &pong.view, &uniforms.blur_v);
        let composite = bind_group(
            "Bloom Composite Bind Group",
            &scene.view,
            &ping.view,
            &uniforms.composite,
        );

        BloomTargets {
            scene,
            ping,
            pong,
            extract,
            blur_h,
            blur_v,
            composite,
        }
    }
}

/// Uniforms for the extract, horizontal blur, vertical blur and composite passes
fn pass_uniforms(config: &BloomConfig, layout: &CompositeLayout) -> [BloomUniforms; 4] {
    let texel = |(width, height): (u32, u32)| [1.0 / width as f32, 1.0 / height as f32];
    let base = BloomUniforms {
        texel_size: texel(layout.bloom),
        direction: [0.0, 0.0],
        threshold: config.threshold,
        strength: config.strength,
        radius: config.radius,
        _padding: 0.0,
    };

    [
        BloomUniforms {
            texel_size: texel(layout.surface),
            ..base
        },
        BloomUniforms {
            direction: [1.0, 0.0],
            ..base
        },
        BloomUniforms {
            direction: [0.0, 1.0],
            ..base
        },
        base,
    ]
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
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
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_uniforms() {
        let layout = CompositeLayout::new(800, 600);
        let [extract, blur_h, blur_v, composite] = pass_uniforms(&BloomConfig::default(), &layout);

        assert_eq!(extract.texel_size, [1.0 / 800.0, 1.0 / 600.0]);
        assert_eq!(blur_h.texel_size, [1.0 / 400.0, 1.0 / 300.0]);
        assert_eq!(blur_h.direction, [1.0, 0.0]);
        assert_eq!(blur_v.direction, [0.0, 1.0]);
        assert_eq!(composite.strength, 1.2);
        assert_eq!(composite.radius, 0.5);
        assert_eq!(composite.threshold, 0.0);
    }
}
