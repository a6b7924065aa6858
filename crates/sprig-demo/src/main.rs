use anyhow::Result;

use sprig_engine::coords::{Color, Rect};
use sprig_engine::core::{App, AppControl, FrameCtx, WindowCtx};
use sprig_engine::device::{Gpu, GpuInit};
use sprig_engine::logging::{init_logging, LoggingConfig};
use sprig_engine::render::{
    FrameStats, RenderCtx, RenderTarget, SpriteRenderer, SpriteRendererConfig, Texture,
};
use sprig_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(RuntimeConfig::default(), GpuInit::default(), SpriteDemo::default())
}

/// Draws a fixed set of sprites every frame.
#[derive(Default)]
struct SpriteDemo {
    scene: Option<Scene>,
    last_stats: Option<FrameStats>,
}

struct Scene {
    renderer: SpriteRenderer,
    red: Texture,
    checker: Texture,
    gradient: Texture,
}

impl App for SpriteDemo {
    fn initialize(&mut self, window: &WindowCtx<'_>, gpu: &Gpu<'_>) -> Result<()> {
        let device = gpu.device();
        let queue = gpu.queue();

        let renderer = SpriteRenderer::new(
            device,
            gpu.surface_format(),
            window.viewport(),
            SpriteRendererConfig::default(),
        )?;

        let red = Texture::solid(device, queue, Color::new(1.0, 0.0, 0.0, 1.0), "red")?;
        let checker = Texture::from_rgba8(device, queue, 8, 8, &checker_pixels(8, 8), "checker")?;
        let gradient =
            Texture::from_rgba8(device, queue, 64, 1, &gradient_pixels(64), "alpha gradient")?;

        self.scene = Some(Scene {
            renderer,
            red,
            checker,
            gradient,
        });
        log::info!("sprite demo initialized");
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(scene) = self.scene.as_mut() else {
            log::error!("frame requested before initialization");
            return AppControl::Exit;
        };

        let last_stats = &mut self.last_stats;
        ctx.render(|rctx, target| {
            let stats = scene.draw(rctx, target)?;
            if last_stats.as_ref() != Some(&stats) {
                log::debug!("frame: {} sprites, {} draw calls", stats.sprites, stats.draw_calls);
                *last_stats = Some(stats);
            }
            Ok(())
        })
    }
}

impl Scene {
    fn draw(&mut self, rctx: &RenderCtx<'_>, target: RenderTarget<'_>) -> Result<FrameStats> {
        let mut frame = self.renderer.begin(rctx, target)?;

        frame.draw_sprite(&self.checker, Rect::new(40.0, 40.0, 240.0, 240.0));
        frame.draw_sprite(&self.red, Rect::new(100.0, 100.0, 50.0, 50.0));

        for i in 0..5 {
            let x = 320.0 + i as f32 * 80.0;
            let tint = Color::new(1.0 - i as f32 * 0.2, 0.4, i as f32 * 0.2, 1.0);
            frame.draw_sprite_tinted(&self.red, Rect::new(x, 120.0, 60.0, 60.0), tint);
        }

        // Overlaps the checker so the blend is visible.
        frame.draw_sprite(&self.gradient, Rect::new(160.0, 220.0, 560.0, 120.0));

        frame.finish()
    }
}

/// Black/white squares, one texel each.
fn checker_pixels(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = if (x + y) % 2 == 0 { 255 } else { 32 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    pixels
}

/// Blue, fading from opaque to fully transparent left to right (straight
/// alpha; premultiplied on upload).
fn gradient_pixels(width: u32) -> Vec<u8> {
    (0..width)
        .flat_map(|x| {
            let a = 255 - (x * 255 / (width - 1).max(1)) as u8;
            [40, 90, 220, a]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_alternates() {
        let px = checker_pixels(2, 2);
        assert_eq!(px.len(), 16);
        assert_eq!(&px[0..4], &[255, 255, 255, 255]);
        assert_eq!(&px[4..8], &[32, 32, 32, 255]);
        assert_eq!(&px[8..12], &[32, 32, 32, 255]);
        assert_eq!(&px[12..16], &[255, 255, 255, 255]);
    }

    #[test]
    fn gradient_spans_full_alpha() {
        let px = gradient_pixels(64);
        assert_eq!(px.len(), 64 * 4);
        assert_eq!(px[3], 255);
        assert_eq!(px[63 * 4 + 3], 0);
    }
}
