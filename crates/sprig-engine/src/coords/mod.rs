//! Coordinate and color types shared by the renderer and the runtime.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! The camera maps this space to NDC; nothing else converts coordinates.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::Color;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
