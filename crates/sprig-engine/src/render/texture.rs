//! Sprite textures: a premultiplied RGBA8 image on the GPU plus the sampler
//! used to read it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use anyhow::{ensure, Context, Result};
use wgpu::util::DeviceExt;

use crate::coords::Color;

/// Process-unique texture identity, used as the pipeline cache key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A sprite image.
///
/// Texels are stored premultiplied, matching the renderer's
/// `src + dst·(1 − srcA)` blend. Renderers cache a bind group per texture; the
/// entry is dropped at the next frame after the `Texture` itself is dropped
/// (or right away through `SpriteRenderer::release_texture`).
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    alive: Arc<()>,
}

impl Texture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Uploads tightly packed straight-alpha RGBA8 pixels, premultiplying
    /// them on the way.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u8],
        label: &str,
    ) -> Result<Self> {
        ensure!(width > 0 && height > 0, "texture '{label}' has zero size");
        let expected = width as usize * height as usize * 4;
        ensure!(
            pixels.len() == expected,
            "texture '{label}': expected {expected} bytes for {width}x{height}, got {}",
            pixels.len()
        );

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: Self::FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &premultiply(pixels),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let id = TextureId::next();
        log::debug!("texture '{label}' {width}x{height} uploaded as {id:?}");

        Ok(Self {
            id,
            texture,
            view,
            sampler,
            alive: Arc::new(()),
        })
    }

    /// Decodes an encoded image (PNG) with the `image` crate and uploads it.
    pub fn from_image_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
    ) -> Result<Self> {
        let image = decode_rgba8(bytes).with_context(|| format!("texture '{label}'"))?;
        Self::from_rgba8(device, queue, image.width(), image.height(), image.as_raw(), label)
    }

    /// A 1×1 texture of a single color.
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color: Color,
        label: &str,
    ) -> Result<Self> {
        Self::from_rgba8(device, queue, 1, 1, &color.to_rgba8(), label)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Expires when this texture is dropped.
    pub(crate) fn liveness(&self) -> Weak<()> {
        Arc::downgrade(&self.alive)
    }

    /// Size in texels.
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

fn premultiply(straight: &[u8]) -> Vec<u8> {
    straight
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3] as u16;
            let mul = |c: u8| ((c as u16 * a + 127) / 255) as u8;
            [mul(px[0]), mul(px[1]), mul(px[2]), px[3]]
        })
        .collect()
}

fn decode_rgba8(bytes: &[u8]) -> Result<image::RgbaImage> {
    let image = image::load_from_memory(bytes).context("failed to decode image")?;
    Ok(image.to_rgba8())
}
