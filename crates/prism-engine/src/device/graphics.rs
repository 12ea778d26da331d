use anyhow::Result;

use crate::coords::{ColorRgba, Rect, Viewport};
use crate::imaging::ImageSource;

use super::{
    DrawCommand, Framebuffer, FramebufferId, PassState, PixelDatatype, PixelFormat,
    ProgramHandle, RenderState, Sampler, TextureHandle, TextureInfo, UniformLayout, UniformMap,
};

/// Graphics device seam used by stages and collections.
///
/// All calls happen on the render thread. Handles are only meaningful to the
/// device that produced them.
pub trait GraphicsDevice {
    /// Compiles `fragment_source` into a program that fills the target viewport.
    ///
    /// `layout` lists every user uniform the program reads; the built-in
    /// `color_texture` / `depth_texture` inputs are always available.
    fn create_viewport_quad_program(
        &mut self,
        fragment_source: &str,
        layout: &UniformLayout,
    ) -> Result<ProgramHandle>;

    fn destroy_program(&mut self, program: ProgramHandle);

    /// Uploads `source` into a new sampled texture.
    fn create_texture(&mut self, source: &ImageSource) -> Result<TextureInfo>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Sampler currently attached to `texture`, if the texture is known.
    fn texture_sampler(&self, texture: TextureHandle) -> Option<Sampler>;

    fn set_texture_sampler(&mut self, texture: TextureHandle, sampler: Sampler);

    /// Returns the shared render state for `viewport`, creating it on first use.
    fn render_state_from_cache(&mut self, viewport: Rect) -> RenderState;

    /// Records `command` against its framebuffer.
    ///
    /// `pass` carries the scissor rectangle when clipping is enabled.
    fn execute(
        &mut self,
        command: &DrawCommand,
        uniforms: &dyn UniformMap,
        pass: Option<&PassState>,
    ) -> Result<()>;

    fn create_framebuffer(
        &mut self,
        size: Viewport,
        format: PixelFormat,
        datatype: PixelDatatype,
    ) -> Result<Framebuffer>;

    /// Destroys the framebuffer together with its color attachments.
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId);

    fn clear_framebuffer(&mut self, framebuffer: FramebufferId, color: ColorRgba) -> Result<()>;
}
