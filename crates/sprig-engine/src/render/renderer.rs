use anyhow::Result;

use crate::coords::{Color, Rect, Viewport};

use super::buffers::{
    create_index_buffer, create_staging_buffer, create_uniform_buffer, create_vertex_buffer,
};
use super::camera::Camera;
use super::geometry::{
    quad_vertices, SpriteVertex, INDICES_PER_SPRITE, QUAD_INDICES, VERTICES_PER_SPRITE,
};
use super::pipeline::{SpritePipeline, SpritePipelineCache};
use super::texture::{Texture, TextureId};
use super::{RenderCtx, RenderTarget};

/// Sprite renderer settings.
#[derive(Debug, Clone)]
pub struct SpriteRendererConfig {
    /// Color the target is cleared to at the start of every frame.
    pub clear_color: Color,

    /// Number of sprites the vertex arena holds before its first growth.
    pub initial_capacity: usize,
}

impl Default for SpriteRendererConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::new(0.9, 0.9, 0.9, 0.0),
            initial_capacity: 64,
        }
    }
}

/// Counters for one finished frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub sprites: usize,
    pub draw_calls: u32,
}

/// Draws textured screen-space quads, one draw call per sprite, in call order.
///
/// Owns everything that outlives a frame: the camera, the shared quad index
/// buffer, the projection-view uniform, the pipeline cache and the vertex
/// arena. Per-frame state lives in [`SpriteFrame`].
///
/// There is no depth test: later sprites composite over earlier ones with
/// `src + dst·(1 − srcA)`, so call order is the z-order.
pub struct SpriteRenderer {
    config: SpriteRendererConfig,
    camera: Camera,

    index_buffer: wgpu::Buffer,
    projection_view_buffer: wgpu::Buffer,
    pipelines: SpritePipelineCache,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize, // in sprites

    // Reused across frames to avoid per-frame allocation.
    vertices: Vec<SpriteVertex>,
    draws: Vec<SpritePipeline>,
}

impl SpriteRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
        config: SpriteRendererConfig,
    ) -> Result<Self> {
        let camera = Camera::from_viewport(viewport);

        let index_buffer = create_index_buffer(device, &QUAD_INDICES, "sprig quad ibo")?;
        let projection_view_buffer =
            create_uniform_buffer(device, &camera.uniform(), "sprig projection-view ubo")?;
        let pipelines = SpritePipelineCache::new(device, surface_format, &projection_view_buffer);

        let vertex_capacity = config.initial_capacity.max(1);
        let vertex_buffer = allocate_vertex_arena(device, vertex_capacity)?;

        log::debug!(
            "sprite renderer ready: {}x{} viewport, {surface_format:?}, arena for {vertex_capacity} sprites",
            viewport.width,
            viewport.height,
        );

        Ok(Self {
            config,
            camera,
            index_buffer,
            projection_view_buffer,
            pipelines,
            vertex_buffer,
            vertex_capacity,
            vertices: Vec::new(),
            draws: Vec::new(),
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn pipelines(&self) -> &SpritePipelineCache {
        &self.pipelines
    }

    /// Sprites the vertex arena can hold without growing.
    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    pub fn clear_color(&self) -> Color {
        self.config.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.config.clear_color = color;
    }

    /// Forgets the cached bindings of a texture that is being dropped.
    pub fn release_texture(&mut self, id: TextureId) {
        self.pipelines.evict(id);
    }

    /// Starts a frame: applies the viewport, advances the camera and records
    /// the projection-view upload (once per frame) into the target's encoder.
    ///
    /// Uploads are recorded rather than queued, so several frames can share
    /// one encoder or one submit and each pass still sees its own data.
    pub fn begin<'a>(
        &'a mut self,
        ctx: &'a RenderCtx<'a>,
        target: RenderTarget<'a>,
    ) -> Result<SpriteFrame<'a>> {
        if ctx.surface_format != self.pipelines.format() {
            log::debug!(
                "target format changed {:?} -> {:?}; rebuilding sprite pipelines",
                self.pipelines.format(),
                ctx.surface_format
            );
            self.pipelines =
                SpritePipelineCache::new(ctx.device, ctx.surface_format, &self.projection_view_buffer);
        }

        let purged = self.pipelines.purge_dropped();
        if purged > 0 {
            log::debug!("released {purged} sprite bindings of dropped textures");
        }

        // A minimized window reports 0x0; keep projecting the last real size.
        if ctx.viewport.is_valid() {
            self.camera.set_viewport(ctx.viewport);
        }
        self.camera.update();

        let staging = create_staging_buffer(
            ctx.device,
            bytemuck::cast_slice(&self.camera.uniform()),
            "sprig projection-view staging",
        )?;
        target.encoder.copy_buffer_to_buffer(
            &staging,
            0,
            &self.projection_view_buffer,
            0,
            staging.size(),
        );

        self.vertices.clear();
        self.draws.clear();

        Ok(SpriteFrame {
            renderer: self,
            ctx,
            target,
        })
    }

    fn ensure_vertex_capacity(&mut self, device: &wgpu::Device, sprites: usize) -> Result<()> {
        if sprites <= self.vertex_capacity {
            return Ok(());
        }

        let new_cap = sprites.next_power_of_two().max(64);
        self.vertex_buffer = allocate_vertex_arena(device, new_cap)?;
        log::debug!("sprite vertex arena grown {} -> {new_cap}", self.vertex_capacity);
        self.vertex_capacity = new_cap;
        Ok(())
    }
}

fn allocate_vertex_arena(device: &wgpu::Device, sprites: usize) -> Result<wgpu::Buffer> {
    let zeros = vec![0.0f32; sprites * VERTICES_PER_SPRITE * SpriteVertex::FLOATS];
    create_vertex_buffer(device, &zeros, "sprig sprite vbo")
}

/// A frame in progress.
///
/// Exists only between [`SpriteRenderer::begin`] and [`SpriteFrame::finish`];
/// sprites queued here are recorded into a single render pass on finish.
/// Dropping the frame without finishing records no pass.
#[must_use = "a frame records nothing until `finish` is called"]
pub struct SpriteFrame<'a> {
    renderer: &'a mut SpriteRenderer,
    ctx: &'a RenderCtx<'a>,
    target: RenderTarget<'a>,
}

impl SpriteFrame<'_> {
    /// Queues `texture` stretched over `rect`, untinted.
    pub fn draw_sprite(&mut self, texture: &Texture, rect: Rect) {
        self.draw_sprite_tinted(texture, rect, Color::WHITE);
    }

    /// Queues `texture` stretched over `rect`, multiplied by `tint.rgb()`.
    pub fn draw_sprite_tinted(&mut self, texture: &Texture, rect: Rect, tint: Color) {
        let renderer = &mut *self.renderer;
        let pipeline = renderer.pipelines.get_or_create(self.ctx.device, texture).clone();
        renderer.vertices.extend_from_slice(&quad_vertices(rect, tint));
        renderer.draws.push(pipeline);
    }

    /// Sprites queued so far.
    pub fn len(&self) -> usize {
        self.renderer.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderer.draws.is_empty()
    }

    /// Records the vertex upload and the pass: clear, then one indexed draw
    /// per sprite in call order.
    ///
    /// On error no pass is recorded and the caller should drop its encoder.
    pub fn finish(self) -> Result<FrameStats> {
        let SpriteFrame {
            renderer,
            ctx,
            target,
        } = self;

        renderer.ensure_vertex_capacity(ctx.device, renderer.draws.len())?;
        if !renderer.vertices.is_empty() {
            let staging = create_staging_buffer(
                ctx.device,
                bytemuck::cast_slice(&renderer.vertices),
                "sprig sprite vertex staging",
            )?;
            target.encoder.copy_buffer_to_buffer(
                &staging,
                0,
                &renderer.vertex_buffer,
                0,
                staging.size(),
            );
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprig sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(renderer.config.clear_color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut draw_calls = 0u32;
        if !renderer.draws.is_empty() {
            rpass.set_index_buffer(renderer.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            rpass.set_vertex_buffer(0, renderer.vertex_buffer.slice(..));

            let mut bound: Option<TextureId> = None;
            for (i, pipeline) in renderer.draws.iter().enumerate() {
                if bound != Some(pipeline.texture()) {
                    pipeline.apply(&mut rpass);
                    bound = Some(pipeline.texture());
                }

                let base_vertex = (i * VERTICES_PER_SPRITE) as i32;
                rpass.draw_indexed(0..INDICES_PER_SPRITE, base_vertex, 0..1);
                draw_calls += 1;
            }
        }
        drop(rpass);

        let sprites = renderer.draws.len();
        // Queued pipelines hold texture views; don't keep them past the frame.
        renderer.draws.clear();

        Ok(FrameStats {
            sprites,
            draw_calls,
        })
    }
}
