use anyhow::Result;

use crate::coords::{ColorRgba, Rect};
use crate::device::{PixelDatatype, PixelFormat, Sampler, TextureFilter};

/// How a stage samples its input color texture.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum SampleMode {
    #[default]
    Nearest,
    Linear,
}

impl SampleMode {
    #[inline]
    pub fn filter(self) -> TextureFilter {
        match self {
            SampleMode::Nearest => TextureFilter::Nearest,
            SampleMode::Linear => TextureFilter::Linear,
        }
    }

    /// Clamp-to-edge sampler using this mode for minification and magnification.
    #[inline]
    pub fn sampler(self) -> Sampler {
        Sampler::clamped(self.filter())
    }
}

/// Construction-time configuration of a [`PostStage`](super::PostStage).
///
/// Only `fragment_shader` is required. The stage takes ownership and never
/// changes the configuration afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    /// Output size relative to the collection's viewport.
    pub texture_scale: f32,

    /// Round the output up to a square power-of-two target.
    pub force_power_of_two: bool,

    pub sample_mode: SampleMode,

    pub pixel_format: PixelFormat,

    pub pixel_datatype: PixelDatatype,

    /// Color the output target is cleared to before the stage runs.
    pub clear_color: ColorRgba,

    /// Region the stage writes to. Empty disables scissoring.
    pub scissor_rectangle: Rect,

    /// Fragment program source.
    pub fragment_shader: String,

    /// Unique name; a v4 UUID is generated when absent.
    pub name: Option<String>,
}

impl StageConfig {
    pub fn new(fragment_shader: impl Into<String>) -> Self {
        Self {
            texture_scale: 1.0,
            force_power_of_two: false,
            sample_mode: SampleMode::Nearest,
            pixel_format: PixelFormat::Rgba,
            pixel_datatype: PixelDatatype::UnsignedByte,
            clear_color: ColorRgba::BLACK,
            scissor_rectangle: Rect::default(),
            fragment_shader: fragment_shader.into(),
            name: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.fragment_shader.trim().is_empty(),
            "post stage requires a fragment shader"
        );
        anyhow::ensure!(
            self.texture_scale.is_finite() && self.texture_scale > 0.0,
            "texture scale must be positive and finite, got {}",
            self.texture_scale
        );
        if let Some(name) = &self.name {
            anyhow::ensure!(!name.is_empty(), "stage name must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = StageConfig::new("fn fs_main() {}");
        assert_eq!(cfg.texture_scale, 1.0);
        assert!(!cfg.force_power_of_two);
        assert_eq!(cfg.sample_mode, SampleMode::Nearest);
        assert_eq!(cfg.pixel_format, PixelFormat::Rgba);
        assert_eq!(cfg.pixel_datatype, PixelDatatype::UnsignedByte);
        assert_eq!(cfg.clear_color, ColorRgba::BLACK);
        assert!(cfg.scissor_rectangle.is_empty());
        assert!(cfg.name.is_none());
    }

    #[test]
    fn blank_shader_is_rejected() {
        assert!(StageConfig::new("  \n").validate().is_err());
    }

    #[test]
    fn bad_scale_is_rejected() {
        let mut cfg = StageConfig::new("x");
        cfg.texture_scale = 0.0;
        assert!(cfg.validate().is_err());
        cfg.texture_scale = f32::INFINITY;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn linear_mode_produces_linear_sampler() {
        let s = SampleMode::Linear.sampler();
        assert_eq!(s.filters(), (TextureFilter::Linear, TextureFilter::Linear));
    }
}
