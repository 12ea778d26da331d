//! A single screen-space post-processing stage.
//!
//! A stage owns its fragment program, the textures it created for its
//! uniforms and the draw command that ties them together. Its framebuffer
//! and any chained inputs belong to the owning [`StageCollection`].
//!
//! Per frame:
//! 1. [`PostStage::update`] resolves uniforms, flushes staged texture work and
//!    makes sure the draw command and render state exist.
//! 2. [`PostStage::execute`] draws into the stage's framebuffer.

mod bindings;
mod collection;
mod command;
mod config;
mod staging;
mod uniforms;


use std::rc::Rc;

use anyhow::{Context, Result};

use crate::coords::Rect;
use crate::device::{
    DrawCommand, GraphicsDevice, PassState, RenderState, Sampler, TextureHandle, TextureInfo,
    UniformValue,
};
use crate::imaging::{FileImageLoader, ImageLoader};

use bindings::UniformBindings;
use command::CommandDriver;
use staging::StagingQueue;
use uniforms::UniformResolver;

pub use collection::StageCollection;
pub use config::{SampleMode, StageConfig};
pub use uniforms::{UniformCallback, UniformInput};

/// Lazily built resource slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lazy<T> {
    Uninitialized,
    Built(T),
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Lazy::Uninitialized
    }
}

impl<T> Lazy<T> {
    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        match self {
            Lazy::Built(v) => Some(v),
            Lazy::Uninitialized => None,
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Lazy::Built(v) => Some(v),
            Lazy::Uninitialized => None,
        }
    }

    #[inline]
    pub(crate) fn take(&mut self) -> Option<T> {
        match std::mem::take(self) {
            Lazy::Built(v) => Some(v),
            Lazy::Uninitialized => None,
        }
    }
}

/// One configurable post-processing pass.
pub struct PostStage {
    name: String,
    config: StageConfig,
    uniforms: UniformResolver,
    staging: StagingQueue,
    driver: CommandDriver,
    loader: Rc<dyn ImageLoader>,
    color_texture: Option<TextureHandle>,
    depth_texture: Option<TextureHandle>,
    enabled: bool,
    destroyed: bool,
}

impl PostStage {
    /// Creates a stage. Fails when the configuration is unusable (e.g. no
    /// fragment shader).
    pub fn new<I, K>(config: StageConfig, uniforms: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, UniformInput)>,
        K: Into<String>,
    {
        config.validate()?;

        let name = config
            .name
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(Self {
            name,
            config,
            uniforms: UniformResolver::new(uniforms.into_iter().map(|(k, v)| (k.into(), v))),
            staging: StagingQueue::default(),
            driver: CommandDriver::default(),
            loader: Rc::new(FileImageLoader::new()),
            color_texture: None,
            depth_texture: None,
            enabled: true,
            destroyed: false,
        })
    }

    pub fn builder(fragment_shader: impl Into<String>) -> StageBuilder {
        StageBuilder::new(fragment_shader)
    }

    /// Replaces the loader used for URL uniforms.
    pub fn with_loader(mut self, loader: Rc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    #[inline]
    pub fn scissor_rectangle(&self) -> Rect {
        self.config.scissor_rectangle
    }

    /// False from the moment a URL or image uniform is written until its
    /// texture is bound, and while a load for a uniform failed and the
    /// uniform has not been rewritten since.
    #[inline]
    pub fn ready(&self) -> bool {
        !self.staging.has_batch()
            && !self.uniforms.awaiting_dispatch()
            && !self.uniforms.has_failures()
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn command(&self) -> Option<&DrawCommand> {
        self.driver.command()
    }

    pub fn sampler(&self) -> Option<Sampler> {
        self.driver.sampler()
    }

    pub fn render_state(&self) -> Option<RenderState> {
        self.driver.render_state()
    }

    /// Desired value of `name`, as last written.
    pub fn uniform(&self, name: &str) -> Option<&UniformInput> {
        self.uniforms.desired(name)
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.names()
    }

    /// Value `name` binds to right now, as the draw command would see it.
    pub fn resolved_uniform(&self, collection: &dyn StageCollection, name: &str) -> Option<UniformValue> {
        self.uniforms.actual().get(name)?.read(collection)
    }

    /// Color attachment of the framebuffer the collection assigned to this stage.
    pub fn output_texture(&self, collection: &dyn StageCollection) -> Option<TextureInfo> {
        collection.framebuffer(&self.name)?.color_texture(0)
    }

    // ── mutation ──────────────────────────────────────────────────────────

    /// Writes the desired value of a uniform.
    ///
    /// A texture previously owned under `name` is released on the next update.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformInput>) {
        if self.destroyed {
            log::warn!("ignoring write to uniform `{name}` of destroyed stage `{}`", self.name);
            return;
        }
        self.uniforms.set(name, value.into(), &mut self.staging);
    }

    /// Enables or disables the stage.
    ///
    /// Disabling releases the program and every texture the stage created for
    /// its uniforms; they are rebuilt on the first update after re-enabling.
    pub fn set_enabled(&mut self, device: &mut dyn GraphicsDevice, enabled: bool) {
        if self.destroyed || self.enabled == enabled {
            return;
        }
        if !enabled {
            self.release_resources(device);
        }
        log::debug!("stage `{}` {}", self.name, if enabled { "enabled" } else { "disabled" });
        self.enabled = enabled;
    }

    /// Prepares the stage for this frame. No-op when disabled or destroyed.
    pub fn update(&mut self, device: &mut dyn GraphicsDevice, collection: &dyn StageCollection) -> Result<()> {
        if self.destroyed || !self.enabled {
            return Ok(());
        }

        self.uniforms.build();
        self.uniforms.settle_kinds();
        self.update_uniform_textures(device, collection);

        self.driver
            .ensure_command(device, &self.config.fragment_shader, self.uniforms.layout())
            .with_context(|| format!("stage `{}`", self.name))?;
        if self.driver.ensure_sampler(self.config.sample_mode) {
            log::debug!("stage `{}` sampler set to {:?}", self.name, self.config.sample_mode);
        }

        let framebuffer = collection
            .framebuffer(&self.name)
            .with_context(|| format!("no framebuffer assigned to stage `{}`", self.name))?;
        let color = framebuffer
            .color_texture(0)
            .with_context(|| format!("framebuffer of stage `{}` has no color attachment", self.name))?;

        if self.driver.ensure_render_state(device, color.size()) {
            log::debug!(
                "stage `{}` render state resized to {}x{}",
                self.name,
                color.width,
                color.height
            );
        }
        self.driver.bind_target(framebuffer.id);
        Ok(())
    }

    /// Draws the stage over `color` / `depth` into its framebuffer.
    ///
    /// No-op when the stage is disabled, not ready, or has not been updated
    /// since a write that changed its uniform layout.
    pub fn execute(
        &mut self,
        device: &mut dyn GraphicsDevice,
        collection: &dyn StageCollection,
        color: TextureInfo,
        depth: Option<TextureInfo>,
    ) -> Result<()> {
        if self.destroyed || !self.enabled || !self.ready() {
            return Ok(());
        }
        if !self.uniforms.is_settled() || !self.driver.is_compiled_for(self.uniforms.layout()) {
            log::debug!("stage `{}` has no program for its current uniforms; skipped", self.name);
            return Ok(());
        }

        self.color_texture = Some(color.handle);
        self.depth_texture = depth.map(|d| d.handle);

        if let Some(sampler) = self.driver.sampler() {
            if device.texture_sampler(color.handle) != Some(sampler) {
                device.set_texture_sampler(color.handle, sampler);
            }
        }

        let scissor = self.config.scissor_rectangle;
        let pass = (!scissor.is_empty()).then_some(PassState { scissor });

        let bindings = UniformBindings::new(
            self.uniforms.actual(),
            collection,
            self.color_texture,
            self.depth_texture,
        );
        self.driver
            .execute(device, &bindings, pass.as_ref())
            .with_context(|| format!("failed to execute stage `{}`", self.name))
    }

    /// Releases every GPU resource the stage owns. Safe to call repeatedly.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if self.destroyed {
            return;
        }
        self.release_resources(device);
        self.staging.release_all(device);
        self.uniforms.release_all(device);
        self.color_texture = None;
        self.depth_texture = None;
        self.enabled = false;
        self.destroyed = true;
        log::debug!("stage `{}` destroyed", self.name);
    }

    // ── internals ─────────────────────────────────────────────────────────

    /// Per-frame flush: finished loads, then releases, then uploads, then new loads.
    fn update_uniform_textures(&mut self, device: &mut dyn GraphicsDevice, collection: &dyn StageCollection) {
        if let Some(outcomes) = self.staging.poll_batch() {
            log::debug!("stage `{}` finished {} image load(s)", self.name, outcomes.len());
            self.uniforms.accept_loads(outcomes, &mut self.staging);
        }

        self.staging.release_all(device);
        self.uniforms.create_staged(device, &mut self.staging);
        self.uniforms
            .dispatch_dirty(&self.name, collection, self.loader.as_ref(), &mut self.staging);
    }

    fn release_resources(&mut self, device: &mut dyn GraphicsDevice) {
        self.driver.release(device);
        let released = self.uniforms.release_materialized(device);
        if released > 0 {
            log::debug!("stage `{}` released {released} uniform texture(s)", self.name);
        }
    }
}

impl Drop for PostStage {
    fn drop(&mut self) {
        if !self.destroyed && (self.driver.command().is_some() || !self.uniforms.actual().is_empty()) {
            log::warn!("stage `{}` dropped without destroy(); GPU resources leaked", self.name);
        }
    }
}

/// Fluent construction of a [`PostStage`].
pub struct StageBuilder {
    config: StageConfig,
    uniforms: Vec<(String, UniformInput)>,
    loader: Option<Rc<dyn ImageLoader>>,
}

impl StageBuilder {
    pub fn new(fragment_shader: impl Into<String>) -> Self {
        Self {
            config: StageConfig::new(fragment_shader),
            uniforms: Vec::new(),
            loader: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    pub fn texture_scale(mut self, scale: f32) -> Self {
        self.config.texture_scale = scale;
        self
    }

    pub fn force_power_of_two(mut self, force: bool) -> Self {
        self.config.force_power_of_two = force;
        self
    }

    pub fn sample_mode(mut self, mode: SampleMode) -> Self {
        self.config.sample_mode = mode;
        self
    }

    pub fn pixel_format(mut self, format: crate::device::PixelFormat) -> Self {
        self.config.pixel_format = format;
        self
    }

    pub fn pixel_datatype(mut self, datatype: crate::device::PixelDatatype) -> Self {
        self.config.pixel_datatype = datatype;
        self
    }

    pub fn clear_color(mut self, color: crate::coords::ColorRgba) -> Self {
        self.config.clear_color = color;
        self
    }

    pub fn scissor_rectangle(mut self, rect: Rect) -> Self {
        self.config.scissor_rectangle = rect;
        self
    }

    pub fn uniform(mut self, name: impl Into<String>, value: impl Into<UniformInput>) -> Self {
        self.uniforms.push((name.into(), value.into()));
        self
    }

    pub fn loader(mut self, loader: Rc<dyn ImageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn build(self) -> Result<PostStage> {
        let stage = PostStage::new(self.config, self.uniforms)?;
        Ok(match self.loader {
            Some(loader) => stage.with_loader(loader),
            None => stage,
        })
    }
}
