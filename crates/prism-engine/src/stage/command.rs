use anyhow::{Context, Result};

use crate::coords::{Rect, Viewport};
use crate::device::{
    DrawCommand, FramebufferId, GraphicsDevice, PassState, RenderState, Sampler, UniformLayout,
    UniformMap,
};

use super::{Lazy, SampleMode};

/// Owns the stage's draw command and the state derived for it.
#[derive(Default)]
pub(crate) struct CommandDriver {
    command: Lazy<DrawCommand>,
    /// Layout the current program was compiled against.
    compiled_layout: UniformLayout,
    sampler: Lazy<Sampler>,
    render_state: Lazy<RenderState>,
}

impl CommandDriver {
    pub(crate) fn command(&self) -> Option<&DrawCommand> {
        self.command.get()
    }

    /// Whether a program exists and was compiled against `layout`.
    pub(crate) fn is_compiled_for(&self, layout: &UniformLayout) -> bool {
        self.command.get().is_some() && self.compiled_layout == *layout
    }

    pub(crate) fn sampler(&self) -> Option<Sampler> {
        self.sampler.get().copied()
    }

    pub(crate) fn render_state(&self) -> Option<RenderState> {
        self.render_state.get().copied()
    }

    /// Compiles the program unless one exists for the same uniform layout.
    pub(crate) fn ensure_command(
        &mut self,
        device: &mut dyn GraphicsDevice,
        fragment_shader: &str,
        layout: &UniformLayout,
    ) -> Result<()> {
        if let Lazy::Built(cmd) = &self.command {
            if self.compiled_layout == *layout {
                return Ok(());
            }
            log::debug!("uniform layout changed; recompiling post stage program");
            device.destroy_program(cmd.program);
            self.command = Lazy::Uninitialized;
        }

        let program = device
            .create_viewport_quad_program(fragment_shader, layout)
            .context("failed to compile post stage program")?;

        let mut command = DrawCommand::new(program);
        command.render_state = self.render_state();
        self.command = Lazy::Built(command);
        self.compiled_layout = layout.clone();
        Ok(())
    }

    /// Rebuilds the sampler when the mode's filter pair changed.
    /// Returns whether a new sampler was built.
    pub(crate) fn ensure_sampler(&mut self, mode: SampleMode) -> bool {
        let wanted = mode.sampler();
        match self.sampler.get() {
            Some(current) if current.filters() == wanted.filters() => false,
            _ => {
                self.sampler = Lazy::Built(wanted);
                true
            }
        }
    }

    /// Fetches a render state for `size` unless the cached one already matches.
    /// Returns whether a new render state was fetched.
    pub(crate) fn ensure_render_state(&mut self, device: &mut dyn GraphicsDevice, size: Viewport) -> bool {
        if let Some(current) = self.render_state.get() {
            if current.viewport.size() == size {
                return false;
            }
        }
        self.render_state = Lazy::Built(device.render_state_from_cache(Rect::from_viewport(size)));
        true
    }

    /// Points the command at `framebuffer` with the current render state.
    pub(crate) fn bind_target(&mut self, framebuffer: FramebufferId) {
        let render_state = self.render_state();
        if let Some(command) = self.command.get_mut() {
            command.framebuffer = Some(framebuffer);
            command.render_state = render_state;
        }
    }

    pub(crate) fn execute(
        &self,
        device: &mut dyn GraphicsDevice,
        uniforms: &dyn UniformMap,
        pass: Option<&PassState>,
    ) -> Result<()> {
        match self.command.get() {
            Some(command) => device.execute(command, uniforms, pass),
            None => Ok(()),
        }
    }

    /// Destroys the program. Sampler and render state are plain values and stay cached.
    pub(crate) fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(command) = self.command.take() {
            device.destroy_program(command.program);
        }
    }
}
