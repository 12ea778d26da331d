use super::{FramebufferId, ProgramHandle, RenderState};

/// Viewport-quad draw command.
///
/// Owns the program handle; the framebuffer belongs to whoever assigned it.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub program: ProgramHandle,
    pub framebuffer: Option<FramebufferId>,
    pub render_state: Option<RenderState>,
}

impl DrawCommand {
    pub fn new(program: ProgramHandle) -> Self {
        Self {
            program,
            framebuffer: None,
            render_state: None,
        }
    }
}
