use crate::coords::{Rect, Viewport};

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

handle_type!(
    /// Device-owned GPU texture.
    TextureHandle
);
handle_type!(
    /// Compiled viewport-quad program.
    ProgramHandle
);
handle_type!(
    /// Render target with one or more color attachments.
    FramebufferId
);

/// A texture handle together with its pixel size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureInfo {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl TextureInfo {
    #[inline]
    pub const fn size(self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

/// Render target description handed out by a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    pub id: FramebufferId,
    pub color_attachments: Vec<TextureInfo>,
}

impl Framebuffer {
    pub fn new(id: FramebufferId, color: TextureInfo) -> Self {
        Self {
            id,
            color_attachments: vec![color],
        }
    }

    #[inline]
    pub fn color_texture(&self, index: usize) -> Option<TextureInfo> {
        self.color_attachments.get(index).copied()
    }
}

// ── pixel formats ─────────────────────────────────────────────────────────

/// Channel layout of an output target.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    #[default]
    Rgba,
    Rgb,
    LuminanceAlpha,
    Luminance,
}

/// Storage type of each channel of an output target.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum PixelDatatype {
    #[default]
    UnsignedByte,
    HalfFloat,
    Float,
}

// ── sampling ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Sampler description attached to a texture.
///
/// Plain value; backends cache the native object per distinct description.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Sampler {
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
}

impl Sampler {
    /// Clamp-to-edge sampler with the given filter for both directions.
    #[inline]
    pub const fn clamped(filter: TextureFilter) -> Self {
        Self {
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            min_filter: filter,
            mag_filter: filter,
        }
    }

    #[inline]
    pub fn filters(self) -> (TextureFilter, TextureFilter) {
        (self.min_filter, self.mag_filter)
    }
}

// ── fixed-function state ──────────────────────────────────────────────────

/// Device-level render state handed out by [`GraphicsDevice::render_state_from_cache`].
///
/// [`GraphicsDevice::render_state_from_cache`]: super::GraphicsDevice::render_state_from_cache
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RenderState {
    pub id: u64,
    pub viewport: Rect,
}

/// Per-execution clipping state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PassState {
    pub scissor: Rect,
}
