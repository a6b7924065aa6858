use super::Vec2;

/// Screen placement of one sprite, in logical pixels (top-left origin).
///
/// Values are trusted as-is: negative or off-screen rects are not rejected,
/// the rasterizer clips whatever falls outside the target.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub const fn origin(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Corners in quad order: top-left, top-right, bottom-right, bottom-left.
    #[inline]
    pub fn corners(self) -> [Vec2; 4] {
        let max = self.max();
        [
            Vec2::new(self.x, self.y),
            Vec2::new(max.x, self.y),
            Vec2::new(max.x, max.y),
            Vec2::new(self.x, max.y),
        ]
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.x && p.y >= self.y && p.x < max.x && p.y < max.y
    }
}
