use crate::device::{Framebuffer, TextureInfo};

/// Owner of a set of stages, as seen from one of its members.
///
/// The collection assigns render targets by stage name and answers
/// cross-stage lookups for chained uniforms.
pub trait StageCollection {
    /// Render target assigned to the stage called `name`.
    fn framebuffer(&self, name: &str) -> Option<Framebuffer>;

    /// Whether a stage called `name` is a member.
    fn contains_stage(&self, name: &str) -> bool;

    /// Current output of the stage called `name`.
    ///
    /// Called every frame by chained uniforms; implementations must not cache
    /// across target reallocation.
    fn output_texture(&self, name: &str) -> Option<TextureInfo> {
        self.framebuffer(name)?.color_texture(0)
    }
}
