/// Viewport size in logical pixels.
///
/// The camera projects this area onto the full render target.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_viewport() {
        assert!(Viewport::new(800.0, 600.0).is_valid());
    }

    #[test]
    fn zero_or_non_finite_is_invalid() {
        assert!(!Viewport::new(0.0, 600.0).is_valid());
        assert!(!Viewport::new(800.0, 0.0).is_valid());
        assert!(!Viewport::new(f32::INFINITY, 600.0).is_valid());
        assert!(!Viewport::new(800.0, f32::NAN).is_valid());
    }
}
