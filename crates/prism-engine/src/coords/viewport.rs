/// Render target size in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Size of an offscreen target derived from this viewport.
    ///
    /// Each side is `ceil(side * scale)`, never below one pixel. With
    /// `force_power_of_two` the result is a square whose side is the next
    /// power of two of the larger dimension, unless both sides already are
    /// powers of two.
    pub fn scaled(self, scale: f32, force_power_of_two: bool) -> Viewport {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let w = ((self.width as f32 * scale).ceil() as u32).max(1);
        let h = ((self.height as f32 * scale).ceil() as u32).max(1);

        if force_power_of_two && !(w.is_power_of_two() && h.is_power_of_two()) {
            let side = w.max(h).next_power_of_two();
            return Viewport::new(side, side);
        }

        Viewport::new(w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_identity() {
        assert_eq!(Viewport::new(640, 480).scaled(1.0, false), Viewport::new(640, 480));
    }

    #[test]
    fn scaled_rounds_up() {
        assert_eq!(Viewport::new(101, 51).scaled(0.5, false), Viewport::new(51, 26));
    }

    #[test]
    fn scaled_never_zero() {
        assert_eq!(Viewport::new(3, 3).scaled(0.01, false), Viewport::new(1, 1));
    }

    #[test]
    fn scaled_invalid_scale_falls_back_to_one() {
        assert_eq!(Viewport::new(10, 20).scaled(f32::NAN, false), Viewport::new(10, 20));
        assert_eq!(Viewport::new(10, 20).scaled(-2.0, false), Viewport::new(10, 20));
    }

    #[test]
    fn power_of_two_squares_larger_side() {
        assert_eq!(Viewport::new(640, 480).scaled(1.0, true), Viewport::new(1024, 1024));
    }

    #[test]
    fn power_of_two_keeps_existing_powers() {
        assert_eq!(Viewport::new(256, 64).scaled(1.0, true), Viewport::new(256, 64));
    }
}
