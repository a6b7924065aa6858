//! Sprite rendering.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - The camera's projection-view uniform converts to NDC in the vertex shader.
//!
//! Frame protocol: [`SpriteRenderer::begin`] → [`SpriteFrame::draw_sprite`]… →
//! [`SpriteFrame::finish`], then the encoder owner submits.

pub mod buffers;
pub mod camera;
mod ctx;
pub mod geometry;
pub mod pipeline;
mod renderer;
pub mod texture;

#[cfg(test)]
pub(crate) mod test_support;

pub use camera::Camera;
pub use ctx::{RenderCtx, RenderTarget};
pub use pipeline::{SpritePipeline, SpritePipelineCache};
pub use renderer::{FrameStats, SpriteFrame, SpriteRenderer, SpriteRendererConfig};
pub use texture::{Texture, TextureId};
