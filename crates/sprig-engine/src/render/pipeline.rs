//! Sprite render pipeline and its bind groups.
//!
//! Group 0 carries the projection-view matrix (vertex stage), group 1 the
//! sprite's sampler + texture (fragment stage). The compiled pipeline and the
//! group-0 bind group do not depend on the texture, so [`SpritePipelineCache`]
//! builds them once and only adds a group-1 bind group per texture.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::geometry::SpriteVertex;
use super::texture::{Texture, TextureId};

const SHADER_SRC: &str = include_str!("shaders/sprite.wgsl");

/// Size of the projection-view uniform: one `mat4x4<f32>`.
pub const PROJECTION_VIEW_SIZE: u64 = 16 * 4;

/// `src·1 + dst·(1 − srcA)` for color and alpha.
pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
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

fn projection_view_min_binding_size() -> wgpu::BufferSize {
    wgpu::BufferSize::new(PROJECTION_VIEW_SIZE)
        .expect("projection-view uniform has non-zero size by construction")
}

/// A ready-to-bind pipeline for one texture. Clones share the GPU objects.
#[derive(Clone)]
pub struct SpritePipeline {
    pub pipeline: Arc<wgpu::RenderPipeline>,
    pub projection_view_bind_group: Arc<wgpu::BindGroup>,
    pub texture_bind_group: Arc<wgpu::BindGroup>,
    texture: TextureId,
    texture_alive: Weak<()>,
}

impl SpritePipeline {
    /// Builds a standalone pipeline for `texture`: compiles the shader, declares
    /// layouts and creates both bind groups.
    ///
    /// Every call allocates a fresh pipeline object. Renderers should go
    /// through [`SpritePipelineCache`] instead.
    pub fn create(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        texture: &Texture,
        projection_view_buffer: &wgpu::Buffer,
    ) -> Self {
        SpritePipelineLayout::new(device, surface_format, projection_view_buffer)
            .bind(device, texture)
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Binds the pipeline and both bind groups on `rpass`.
    pub fn apply(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &*self.projection_view_bind_group, &[]);
        rpass.set_bind_group(1, &*self.texture_bind_group, &[]);
    }
}

/// Texture-independent half of a sprite pipeline.
pub struct SpritePipelineLayout {
    format: wgpu::TextureFormat,
    pipeline: Arc<wgpu::RenderPipeline>,
    texture_bgl: wgpu::BindGroupLayout,
    projection_view_bind_group: Arc<wgpu::BindGroup>,
}

impl SpritePipelineLayout {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        projection_view_buffer: &wgpu::Buffer,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprig sprite shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SRC.into()),
        });

        let projection_view_bgl =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sprig projection-view bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(projection_view_min_binding_size()),
                    },
                    count: None,
                }],
            });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprig texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprig sprite pipeline layout"),
            bind_group_layouts: &[&projection_view_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprig sprite pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[SpriteVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            // No culling: the Y flip in the camera reverses apparent winding.
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
            multiview_mask: None,
            cache: None,
        });

        let projection_view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprig projection-view bind group"),
            layout: &projection_view_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: projection_view_buffer.as_entire_binding(),
            }],
        });

        log::debug!("sprite pipeline compiled for {surface_format:?}");

        Self {
            format: surface_format,
            pipeline: Arc::new(pipeline),
            texture_bgl,
            projection_view_bind_group: Arc::new(projection_view_bind_group),
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Creates the texture bind group for `texture` and pairs it with the shared
    /// pipeline and projection-view bind group.
    pub fn bind(&self, device: &wgpu::Device, texture: &Texture) -> SpritePipeline {
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprig texture bind group"),
            layout: &self.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(texture.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
            ],
        });

        SpritePipeline {
            pipeline: Arc::clone(&self.pipeline),
            projection_view_bind_group: Arc::clone(&self.projection_view_bind_group),
            texture_bind_group: Arc::new(texture_bind_group),
            texture: texture.id(),
            texture_alive: texture.liveness(),
        }
    }
}

/// Sprite pipelines keyed by texture identity, built on first use.
///
/// Each entry holds a bind group that keeps its texture view alive, so entries
/// must be evicted: explicitly with [`evict`](Self::evict), or in bulk with
/// [`purge_dropped`](Self::purge_dropped) once the `Texture` is gone.
pub struct SpritePipelineCache {
    layout: SpritePipelineLayout,
    pipelines: HashMap<TextureId, SpritePipeline>,
}

impl SpritePipelineCache {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        projection_view_buffer: &wgpu::Buffer,
    ) -> Self {
        Self {
            layout: SpritePipelineLayout::new(device, surface_format, projection_view_buffer),
            pipelines: HashMap::new(),
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.layout.format()
    }

    pub fn get_or_create(&mut self, device: &wgpu::Device, texture: &Texture) -> &SpritePipeline {
        let layout = &self.layout;
        self.pipelines.entry(texture.id()).or_insert_with(|| {
            log::debug!("binding sprite pipeline for {:?}", texture.id());
            layout.bind(device, texture)
        })
    }

    pub fn get(&self, id: TextureId) -> Option<&SpritePipeline> {
        self.pipelines.get(&id)
    }

    /// Drops the cached bind group for a texture that is going away.
    pub fn evict(&mut self, id: TextureId) -> bool {
        self.pipelines.remove(&id).is_some()
    }

    /// Drops entries whose `Texture` no longer exists. Returns how many went.
    pub fn purge_dropped(&mut self) -> usize {
        let before = self.pipelines.len();
        self.pipelines.retain(|_, p| p.texture_alive.strong_count() > 0);
        before - self.pipelines.len()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
