//! Pixel-space geometry and color value types.
//!
//! Canonical space for everything in this crate:
//! - physical (device) pixels
//! - origin top-left of the render target
//! - +X right, +Y down
//!
//! These are plain values; nothing here owns GPU state.

mod color;
mod rect;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use viewport::Viewport;
