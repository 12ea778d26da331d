//! In-memory doubles for the device, collection and loader seams.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use anyhow::Result;

use crate::coords::{ColorRgba, Rect, Viewport};
use crate::device::{
    DrawCommand, Framebuffer, FramebufferId, GraphicsDevice, PassState, PixelDatatype, PixelFormat,
    ProgramHandle, RenderState, Sampler, TextureHandle, TextureInfo, UniformLayout, UniformMap,
    UniformValue,
};
use crate::imaging::{ImageFuture, ImageLoader, ImageSource};
use crate::stage::StageCollection;

pub(crate) const FRAGMENT: &str = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";

/// What one `execute` call saw.
#[derive(Debug, Clone)]
pub(crate) struct Execution {
    pub command: DrawCommand,
    pub uniforms: HashMap<String, Option<UniformValue>>,
    pub pass: Option<PassState>,
}

/// Records every device call; hands out sequential handles.
#[derive(Default)]
pub(crate) struct MockDevice {
    next: u64,
    pub programs: BTreeSet<ProgramHandle>,
    pub layouts: HashMap<ProgramHandle, UniformLayout>,
    pub compile_count: usize,
    pub textures: BTreeSet<TextureHandle>,
    pub destroyed_textures: Vec<TextureHandle>,
    pub destroyed_programs: Vec<ProgramHandle>,
    pub samplers: HashMap<TextureHandle, Sampler>,
    pub sampler_writes: usize,
    pub render_state_calls: usize,
    render_states: HashMap<Rect, RenderState>,
    pub framebuffers: HashMap<FramebufferId, Framebuffer>,
    pub clears: Vec<(FramebufferId, ColorRgba)>,
    pub executions: Vec<Execution>,
    pub fail_compile: bool,
    pub fail_upload: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Registers a texture as if the caller had created it.
    pub fn supplied_texture(&mut self, width: u32, height: u32) -> TextureInfo {
        let handle = TextureHandle::from_raw(self.next_id());
        self.textures.insert(handle);
        TextureInfo { handle, width, height }
    }

    pub fn destroy_count(&self, texture: TextureHandle) -> usize {
        self.destroyed_textures.iter().filter(|t| **t == texture).count()
    }

    pub fn last_execution(&self) -> Option<&Execution> {
        self.executions.last()
    }
}

impl GraphicsDevice for MockDevice {
    fn create_viewport_quad_program(&mut self, _fragment: &str, layout: &UniformLayout) -> Result<ProgramHandle> {
        anyhow::ensure!(!self.fail_compile, "shader compilation failed");
        let program = ProgramHandle::from_raw(self.next_id());
        self.programs.insert(program);
        self.layouts.insert(program, layout.clone());
        self.compile_count += 1;
        Ok(program)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.destroyed_programs.push(program);
    }

    fn create_texture(&mut self, source: &ImageSource) -> Result<TextureInfo> {
        anyhow::ensure!(!self.fail_upload, "texture upload failed");
        Ok(self.supplied_texture(source.width(), source.height()))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
        self.samplers.remove(&texture);
        self.destroyed_textures.push(texture);
    }

    fn texture_sampler(&self, texture: TextureHandle) -> Option<Sampler> {
        self.samplers.get(&texture).copied()
    }

    fn set_texture_sampler(&mut self, texture: TextureHandle, sampler: Sampler) {
        self.sampler_writes += 1;
        self.samplers.insert(texture, sampler);
    }

    fn render_state_from_cache(&mut self, viewport: Rect) -> RenderState {
        self.render_state_calls += 1;
        let id = self.render_states.len() as u64 + 1;
        *self
            .render_states
            .entry(viewport)
            .or_insert(RenderState { id, viewport })
    }

    fn execute(&mut self, command: &DrawCommand, uniforms: &dyn UniformMap, pass: Option<&PassState>) -> Result<()> {
        anyhow::ensure!(self.programs.contains(&command.program), "unknown program");
        let layout = self.layouts.get(&command.program).cloned().unwrap_or_default();
        let mut seen: HashMap<String, Option<UniformValue>> = layout
            .iter()
            .map(|(name, _)| (name.to_string(), uniforms.value(name)))
            .collect();
        for builtin in [crate::device::COLOR_TEXTURE, crate::device::DEPTH_TEXTURE] {
            seen.insert(builtin.to_string(), uniforms.value(builtin));
        }
        self.executions.push(Execution {
            command: command.clone(),
            uniforms: seen,
            pass: pass.copied(),
        });
        Ok(())
    }

    fn create_framebuffer(&mut self, size: Viewport, _format: PixelFormat, _datatype: PixelDatatype) -> Result<Framebuffer> {
        let color = self.supplied_texture(size.width, size.height);
        let fb = Framebuffer::new(FramebufferId::from_raw(self.next_id()), color);
        self.framebuffers.insert(fb.id, fb.clone());
        Ok(fb)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(fb) = self.framebuffers.remove(&framebuffer) {
            for color in fb.color_attachments {
                self.destroy_texture(color.handle);
            }
        }
    }

    fn clear_framebuffer(&mut self, framebuffer: FramebufferId, color: ColorRgba) -> Result<()> {
        anyhow::ensure!(self.framebuffers.contains_key(&framebuffer), "unknown framebuffer");
        self.clears.push((framebuffer, color));
        Ok(())
    }
}

// ── collection ────────────────────────────────────────────────────────────

/// Fixed name → framebuffer table.
#[derive(Default)]
pub(crate) struct MockCollection {
    pub framebuffers: HashMap<String, Framebuffer>,
}

impl MockCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a target on `device` and assigns it to `name`.
    pub fn assign(&mut self, device: &mut MockDevice, name: &str, size: Viewport) -> Framebuffer {
        let fb = device
            .create_framebuffer(size, PixelFormat::Rgba, PixelDatatype::UnsignedByte)
            .unwrap();
        self.framebuffers.insert(name.to_string(), fb.clone());
        fb
    }
}

impl StageCollection for MockCollection {
    fn framebuffer(&self, name: &str) -> Option<Framebuffer> {
        self.framebuffers.get(name).cloned()
    }

    fn contains_stage(&self, name: &str) -> bool {
        self.framebuffers.contains_key(name)
    }
}

// ── loader ────────────────────────────────────────────────────────────────

type Slot = Rc<RefCell<Option<Result<ImageSource>>>>;

/// Future that completes once its slot is filled.
struct ManualFuture(Slot);

impl Future for ManualFuture {
    type Output = Result<ImageSource>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.0.borrow_mut().take() {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}

/// Loader whose loads finish only when the test says so.
#[derive(Default)]
pub(crate) struct ManualLoader {
    pending: RefCell<Vec<(String, Slot)>>,
    pub requested: RefCell<Vec<String>>,
}

impl ManualLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Completes every outstanding load of `url` with a `size`×`size` image.
    pub fn finish(&self, url: &str, size: u32) {
        self.complete(url, || ImageSource::solid(size, size, [255, 0, 0, 255]));
    }

    pub fn fail(&self, url: &str) {
        self.complete(url, || Err(anyhow::anyhow!("404: {url}")));
    }

    pub fn request_count(&self) -> usize {
        self.requested.borrow().len()
    }

    fn complete(&self, url: &str, result: impl Fn() -> Result<ImageSource>) {
        self.pending.borrow_mut().retain(|(u, slot)| {
            if u == url {
                *slot.borrow_mut() = Some(result());
                false
            } else {
                true
            }
        });
    }
}

impl ImageLoader for ManualLoader {
    fn load(&self, url: &str) -> ImageFuture {
        let slot: Slot = Rc::new(RefCell::new(None));
        self.pending.borrow_mut().push((url.to_string(), Rc::clone(&slot)));
        self.requested.borrow_mut().push(url.to_string());
        Box::pin(ManualFuture(slot))
    }
}
