use super::Viewport;

/// Axis-aligned rectangle in physical pixels (top-left origin).
///
/// A rectangle with zero width or height is "empty"; scissor rectangles use
/// that state to mean "no scissor".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole viewport.
    #[inline]
    pub const fn from_viewport(viewport: Viewport) -> Self {
        Self::new(0, 0, viewport.width, viewport.height)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub const fn size(self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Clamps the rectangle to `bounds`.
    ///
    /// Returns `None` if nothing of the rectangle lies inside the bounds.
    pub fn clamped_to(self, bounds: Viewport) -> Option<Rect> {
        let x0 = self.x.min(bounds.width);
        let y0 = self.y.min(bounds.height);
        let x1 = self.x.saturating_add(self.width).min(bounds.width);
        let y1 = self.y.saturating_add(self.height).min(bounds.height);

        let r = Rect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0));
        if r.is_empty() { None } else { Some(r) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── is_empty ──────────────────────────────────────────────────────────

    #[test]
    fn default_is_empty() {
        assert!(Rect::default().is_empty());
    }

    #[test]
    fn zero_width_or_height_is_empty() {
        assert!(Rect::new(4, 4, 0, 10).is_empty());
        assert!(Rect::new(4, 4, 10, 0).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
    }

    // ── clamped_to ────────────────────────────────────────────────────────

    #[test]
    fn clamped_inside_is_identity() {
        let r = Rect::new(10, 10, 20, 20);
        assert_eq!(r.clamped_to(Viewport::new(100, 100)), Some(r));
    }

    #[test]
    fn clamped_overhang_is_trimmed() {
        let r = Rect::new(90, 80, 50, 50);
        assert_eq!(r.clamped_to(Viewport::new(100, 100)), Some(Rect::new(90, 80, 10, 20)));
    }

    #[test]
    fn clamped_outside_returns_none() {
        assert_eq!(Rect::new(200, 0, 10, 10).clamped_to(Viewport::new(100, 100)), None);
    }

    #[test]
    fn clamped_does_not_overflow() {
        let r = Rect::new(u32::MAX - 1, 0, u32::MAX, 5);
        assert_eq!(r.clamped_to(Viewport::new(100, 100)), None);
    }
}
