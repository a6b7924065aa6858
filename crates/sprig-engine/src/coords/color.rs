/// Straight-alpha RGBA color with `f32` channels in `[0, 1]`.
///
/// Used for the frame clear color (written to the target as given) and for
/// sprite tints. Sprite tints only carry RGB into the vertex stream; alpha
/// comes from the sampled texture, which stores premultiplied texels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from straight 8-bit channels (`0`–`255`).
    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Quantizes to RGBA8, rounding to nearest.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    #[inline]
    pub const fn rgb(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_round_trip_of_extremes() {
        assert_eq!(Color::from_rgba8(255, 0, 0, 255).to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(Color::TRANSPARENT.to_rgba8(), [0, 0, 0, 0]);
    }

    #[test]
    fn to_rgba8_rounds_and_clamps() {
        assert_eq!(Color::new(0.2, 2.0, -1.0, 0.5).to_rgba8(), [51, 255, 0, 128]);
    }

    #[test]
    fn rgb_drops_alpha() {
        assert_eq!(Color::new(0.1, 0.2, 0.3, 0.4).rgb(), [0.1, 0.2, 0.3]);
    }

    #[test]
    fn to_wgpu_widens_channels() {
        let c = Color::new(0.5, 0.25, 0.0, 1.0).to_wgpu();
        assert_eq!((c.r, c.g, c.b, c.a), (0.5, 0.25, 0.0, 1.0));
    }
}
