//! Layer textures and the pipelines that scale them onto the frame.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Size};
use crate::host::Blend;

// ── blend ─────────────────────────────────────────────────────────────────

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── placement uniform ─────────────────────────────────────────────────────

/// Source sub-rectangle in UV space, for destinations clipped by the frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Placement {
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
}

/// Clips `dst` to a `target`-sized frame.
///
/// Returns the visible rectangle (a valid wgpu viewport) and the matching
/// part of the source texture, or `None` if nothing is visible.
pub(crate) fn place(dst: Rect, target: Size) -> Option<(Rect, Placement)> {
    if dst.is_empty() {
        return None;
    }
    let clip = dst.intersect(&Rect::from_size(target))?;

    let (w, h) = (dst.width as f32, dst.height as f32);
    let u = |x: i32| (x - dst.x) as f32 / w;
    let v = |y: i32| (y - dst.y) as f32 / h;

    let placement = Placement {
        uv_min: [u(clip.x), v(clip.y)],
        uv_max: [u(clip.x + clip.width as i32), v(clip.y + clip.height as i32)],
    };
    Some((clip, placement))
}

// ── layer texture ─────────────────────────────────────────────────────────

/// GPU copy of one uploaded [`crate::PixelBuffer`], with its own bind group.
pub(crate) struct LayerTexture {
    texture: wgpu::Texture,
    placement: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    size: Size,
}

impl LayerTexture {
    pub(crate) fn size(&self) -> Size {
        self.size
    }

    pub(crate) fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

// ── blitter ───────────────────────────────────────────────────────────────

/// Pipelines, sampler and layout shared by all layers.
pub(crate) struct Blitter {
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    over: wgpu::RenderPipeline,
    src: wgpu::RenderPipeline,
    texture_format: wgpu::TextureFormat,
}

impl Blitter {
    pub(crate) fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sparkle blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sparkle blit bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<Placement>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sparkle blit pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = |label, blend| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let over = pipeline("sparkle blit over pipeline", premul_alpha_blend());
        let src = pipeline("sparkle blit src pipeline", wgpu::BlendState::REPLACE);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sparkle blit sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        // Buffer bytes are sRGB-encoded; sample them through an sRGB view so
        // an sRGB surface writes them back unchanged.
        let texture_format = if surface_format.is_srgb() {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        Self { bind_group_layout, sampler, over, src, texture_format }
    }

    pub(crate) fn pipeline(&self, blend: Blend) -> &wgpu::RenderPipeline {
        match blend {
            Blend::Over => &self.over,
            Blend::Src => &self.src,
        }
    }

    /// Creates a texture (and bind group) able to hold a `size` buffer.
    pub(crate) fn create_layer(&self, device: &wgpu::Device, size: Size) -> LayerTexture {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sparkle layer texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.texture_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let placement = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sparkle layer placement ubo"),
            size: std::mem::size_of::<Placement>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sparkle layer bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: placement.as_entire_binding(),
                },
            ],
        });

        LayerTexture { texture, placement, bind_group, size }
    }

    /// Records a pass drawing `layer` into `viewport` of `target`.
    pub(crate) fn draw(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        layer: &LayerTexture,
        (viewport, placement): (Rect, Placement),
        blend: Blend,
    ) {
        queue.write_buffer(&layer.placement, 0, bytemuck::bytes_of(&placement));

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sparkle blit pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );
        rpass.set_pipeline(self.pipeline(blend));
        rpass.set_bind_group(0, &layer.bind_group, &[]);
        rpass.draw(0..4, 0..1);
    }
}
