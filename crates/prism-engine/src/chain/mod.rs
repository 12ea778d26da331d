//! Ordered list of stages sharing one input, each feeding the next.
//!
//! [`StageChain`] is the owning [`StageCollection`]: it sizes and allocates
//! a framebuffer per stage from the current viewport and answers cross-stage
//! lookups for chained uniforms.

mod targets;

use anyhow::{Context, Result};

use crate::coords::Viewport;
use crate::device::{GraphicsDevice, TextureInfo};
use crate::stage::{PostStage, StageCollection};

use targets::TargetRegistry;

#[derive(Default)]
pub struct StageChain {
    stages: Vec<PostStage>,
    targets: TargetRegistry,
}

impl StageChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `stage`. Fails when a stage with the same name is already present.
    pub fn add(&mut self, stage: PostStage) -> Result<()> {
        anyhow::ensure!(
            !self.targets.contains_stage(stage.name()),
            "a stage named `{}` is already in the chain",
            stage.name()
        );
        anyhow::ensure!(!stage.is_destroyed(), "stage `{}` is destroyed", stage.name());

        log::debug!("chain: added stage `{}`", stage.name());
        self.targets.register(stage.name());
        self.stages.push(stage);
        Ok(())
    }

    /// Destroys and removes the stage called `name` together with its target.
    /// Returns false when no such stage exists.
    pub fn remove(&mut self, device: &mut dyn GraphicsDevice, name: &str) -> bool {
        let Some(index) = self.stages.iter().position(|s| s.name() == name) else {
            return false;
        };
        let mut stage = self.stages.remove(index);
        stage.destroy(device);
        self.targets.unregister(device, name);
        log::debug!("chain: removed stage `{name}`");
        true
    }

    pub fn stage(&self, name: &str) -> Option<&PostStage> {
        self.stages.iter().find(|s| s.name() == name)
    }

    pub fn stage_mut(&mut self, name: &str) -> Option<&mut PostStage> {
        self.stages.iter_mut().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostStage> {
        self.stages.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The chain as seen by its members.
    pub fn collection(&self) -> &dyn StageCollection {
        &self.targets
    }

    /// True when every enabled stage is ready.
    pub fn ready(&self) -> bool {
        self.stages.iter().filter(|s| s.enabled()).all(PostStage::ready)
    }

    /// Enables or disables one stage. Disabling also releases its target.
    pub fn set_enabled(&mut self, device: &mut dyn GraphicsDevice, name: &str, enabled: bool) -> bool {
        let Some(stage) = self.stages.iter_mut().find(|s| s.name() == name) else {
            return false;
        };
        stage.set_enabled(device, enabled);
        if !enabled {
            self.targets.release(device, name);
        }
        true
    }

    /// Sizes every enabled stage's target for `viewport`, then updates the stages.
    pub fn update(&mut self, device: &mut dyn GraphicsDevice, viewport: Viewport) -> Result<()> {
        anyhow::ensure!(
            viewport.is_valid(),
            "viewport has zero size ({}x{})",
            viewport.width,
            viewport.height
        );

        for stage in self.stages.iter().filter(|s| s.enabled()) {
            let cfg = stage.config();
            let size = viewport.scaled(cfg.texture_scale, cfg.force_power_of_two);
            self.targets
                .ensure(device, stage.name(), size, cfg.pixel_format, cfg.pixel_datatype)
                .with_context(|| format!("failed to allocate target for stage `{}`", stage.name()))?;
        }

        for stage in &mut self.stages {
            stage.update(device, &self.targets)?;
        }
        Ok(())
    }

    /// Runs every enabled, ready stage in order.
    ///
    /// Each stage reads the previous stage's output; the first reads `color`.
    /// Stages that are disabled or still loading pass their input through.
    /// Returns the texture holding the final image.
    pub fn execute(
        &mut self,
        device: &mut dyn GraphicsDevice,
        color: TextureInfo,
        depth: Option<TextureInfo>,
    ) -> Result<TextureInfo> {
        let mut input = color;

        for stage in &mut self.stages {
            if !stage.enabled() {
                continue;
            }
            if !stage.ready() {
                log::debug!("chain: stage `{}` not ready; passing input through", stage.name());
                continue;
            }
            let Some(framebuffer) = self.targets.framebuffer(stage.name()) else {
                continue;
            };
            let output = framebuffer
                .color_texture(0)
                .with_context(|| format!("target of stage `{}` has no color attachment", stage.name()))?;

            device.clear_framebuffer(framebuffer.id, stage.config().clear_color)?;
            stage.execute(device, &self.targets, input, depth)?;
            input = output;
        }

        Ok(input)
    }

    /// Destroys every stage and target. The chain is empty afterwards.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for stage in &mut self.stages {
            stage.destroy(device);
        }
        self.stages.clear();
        self.targets.clear(device);
    }
}

#[cfg(test)]
mod tests;
