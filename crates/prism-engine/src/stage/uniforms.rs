//! Desired vs. resolved uniform values.
//!
//! Callers write [`UniformInput`]s. Inputs that can be bound right away
//! (literals, callbacks, textures) become actual values on write. Deferred
//! inputs (URLs, stage references, CPU images) wait in the dirty set until
//! the next flush dispatches them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::coords::ColorRgba;
use crate::device::{GraphicsDevice, TextureHandle, UniformKind, UniformLayout, UniformValue};
use crate::imaging::{self, ImageLoader, ImageSource};

use super::collection::StageCollection;
use super::staging::{LoadBatch, LoadOutcome, PendingLoad, StagedTexture, StagingQueue};

/// Zero-argument uniform producer, evaluated every time the value is read.
pub type UniformCallback = Rc<dyn Fn() -> UniformValue>;

/// Caller-facing uniform value.
#[derive(Clone)]
pub enum UniformInput {
    /// Literal scalar, vector or color.
    Value(UniformValue),
    /// Re-evaluated on every read.
    Callback(UniformCallback),
    /// GPU texture. Ownership moves to the stage.
    Texture(TextureHandle),
    /// Image to load through the stage's [`ImageLoader`], unless it names a
    /// stage of the owning collection.
    Url(String),
    /// Output of another stage of the owning collection.
    Stage(String),
    /// Decoded image to upload.
    Image(ImageSource),
}

impl UniformInput {
    pub fn value(v: impl Into<UniformValue>) -> Self {
        match v.into() {
            UniformValue::Texture(t) => UniformInput::Texture(t),
            v => UniformInput::Value(v),
        }
    }

    pub fn callback(f: impl Fn() -> UniformValue + 'static) -> Self {
        UniformInput::Callback(Rc::new(f))
    }

    pub fn url(url: impl Into<String>) -> Self {
        UniformInput::Url(url.into())
    }

    pub fn stage(name: impl Into<String>) -> Self {
        UniformInput::Stage(name.into())
    }

    /// Whether the input needs a flush (and possibly a load) before it can be bound.
    #[inline]
    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            UniformInput::Url(_) | UniformInput::Stage(_) | UniformInput::Image(_)
        )
    }

    #[inline]
    pub fn as_texture(&self) -> Option<TextureHandle> {
        match self {
            UniformInput::Texture(t) => Some(*t),
            _ => None,
        }
    }

    /// Shader-side type, when known without running anything.
    ///
    /// `None` for callbacks; their type is taken from the first read during
    /// an update.
    pub(crate) fn kind(&self) -> Option<UniformKind> {
        match self {
            UniformInput::Value(v) => Some(v.kind()),
            UniformInput::Callback(_) => None,
            _ => Some(UniformKind::Texture),
        }
    }

    /// Needs a texture load or upload before it can be bound.
    fn is_loadable(&self) -> bool {
        matches!(self, UniformInput::Url(_) | UniformInput::Image(_))
    }

    /// Actual value for an input that is not deferred.
    fn resolve_now(&self) -> Option<ActualUniform> {
        match self {
            UniformInput::Value(v) => Some(ActualUniform::Value(*v)),
            UniformInput::Callback(f) => Some(ActualUniform::Callback(Rc::clone(f))),
            UniformInput::Texture(handle) => Some(ActualUniform::Texture {
                handle: *handle,
                origin: TextureOrigin::Supplied,
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for UniformInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformInput::Value(v) => f.debug_tuple("Value").field(v).finish(),
            UniformInput::Callback(_) => f.write_str("Callback(..)"),
            UniformInput::Texture(t) => f.debug_tuple("Texture").field(t).finish(),
            UniformInput::Url(u) => f.debug_tuple("Url").field(u).finish(),
            UniformInput::Stage(s) => f.debug_tuple("Stage").field(s).finish(),
            UniformInput::Image(i) => f
                .debug_tuple("Image")
                .field(&format_args!("{}x{}", i.width(), i.height()))
                .finish(),
        }
    }
}

macro_rules! input_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for UniformInput {
                fn from(v: $t) -> Self {
                    UniformInput::value(v)
                }
            }
        )*
    };
}

input_from_value!(f32, i32, bool, [f32; 2], [f32; 3], [f32; 4], ColorRgba, TextureHandle, UniformValue);

impl From<ImageSource> for UniformInput {
    fn from(img: ImageSource) -> Self {
        UniformInput::Image(img)
    }
}

// ── resolved values ───────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TextureOrigin {
    /// Handed in by the caller. Released on supersession or destroy.
    Supplied,
    /// Created by the stage from a deferred input. Also released on disable.
    Materialized,
}

#[derive(Clone)]
pub(crate) enum ActualUniform {
    Value(UniformValue),
    Callback(UniformCallback),
    Texture {
        handle: TextureHandle,
        origin: TextureOrigin,
    },
    /// Looked up through the collection on every read; never owned.
    StageOutput(String),
}

impl ActualUniform {
    fn owned_texture(&self) -> Option<TextureHandle> {
        match self {
            ActualUniform::Texture { handle, .. } => Some(*handle),
            _ => None,
        }
    }

    /// Evaluates the binding for this frame.
    pub(crate) fn read(&self, collection: &dyn StageCollection) -> Option<UniformValue> {
        match self {
            ActualUniform::Value(v) => Some(*v),
            ActualUniform::Callback(f) => Some(f()),
            ActualUniform::Texture { handle, .. } => Some(UniformValue::Texture(*handle)),
            ActualUniform::StageOutput(stage) => collection
                .output_texture(stage)
                .map(|t| UniformValue::Texture(t.handle)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum MapState {
    Uninitialized,
    Built,
}

// ── resolver ──────────────────────────────────────────────────────────────

/// Keeps actual uniforms consistent with desired ones.
pub(crate) struct UniformResolver {
    desired: BTreeMap<String, UniformInput>,
    actual: HashMap<String, ActualUniform>,
    dirty: BTreeSet<String>,
    /// Bumped on every write; load results for older revisions are dropped.
    revisions: HashMap<String, u64>,
    /// Uniforms whose load or upload failed for their current revision.
    failed: BTreeSet<String>,
    /// Callback uniforms whose type is not in `layout` yet.
    untyped: BTreeSet<String>,
    layout: UniformLayout,
    state: MapState,
}

impl UniformResolver {
    pub(crate) fn new(uniforms: impl IntoIterator<Item = (String, UniformInput)>) -> Self {
        let mut resolver = Self {
            desired: BTreeMap::new(),
            actual: HashMap::new(),
            dirty: BTreeSet::new(),
            revisions: HashMap::new(),
            failed: BTreeSet::new(),
            untyped: BTreeSet::new(),
            layout: UniformLayout::new(),
            state: MapState::Uninitialized,
        };
        for (name, input) in uniforms {
            resolver.declare(&name, &input);
            resolver.desired.insert(name, input);
        }
        resolver
    }

    fn declare(&mut self, name: &str, input: &UniformInput) {
        match input.kind() {
            Some(kind) => {
                self.untyped.remove(name);
                self.layout.insert(name, kind);
            }
            None => {
                self.untyped.insert(name.to_string());
            }
        }
    }

    /// Reads each callback whose type is still unknown once and records it.
    pub(crate) fn settle_kinds(&mut self) {
        for name in std::mem::take(&mut self.untyped) {
            if let Some(UniformInput::Callback(f)) = self.desired.get(&name) {
                let kind = f().kind();
                self.layout.insert(name, kind);
            }
        }
    }

    /// Whether every uniform's type is known.
    pub(crate) fn is_settled(&self) -> bool {
        self.untyped.is_empty()
    }

    /// True while a URL or image uniform has been written but its load has
    /// not been dispatched yet. Stage references are not counted: one naming
    /// an unknown stage may wait indefinitely.
    pub(crate) fn awaiting_dispatch(&self) -> bool {
        match self.state {
            MapState::Uninitialized => self.desired.values().any(UniformInput::is_loadable),
            MapState::Built => self
                .dirty
                .iter()
                .filter_map(|name| self.desired.get(name))
                .any(UniformInput::is_loadable),
        }
    }

    pub(crate) fn desired(&self, name: &str) -> Option<&UniformInput> {
        self.desired.get(name)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.desired.keys().map(String::as_str)
    }

    pub(crate) fn actual(&self) -> &HashMap<String, ActualUniform> {
        &self.actual
    }

    pub(crate) fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    #[cfg(test)]
    pub(crate) fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    pub(crate) fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn is_built(&self) -> bool {
        self.state == MapState::Built
    }

    fn revision(&self, name: &str) -> u64 {
        self.revisions.get(name).copied().unwrap_or(0)
    }

    /// Classifies every desired entry once.
    pub(crate) fn build(&mut self) {
        if self.state == MapState::Built {
            return;
        }

        for (name, input) in &self.desired {
            match input.resolve_now() {
                Some(actual) => {
                    self.actual.insert(name.clone(), actual);
                }
                None => {
                    self.dirty.insert(name.clone());
                }
            }
        }

        self.state = MapState::Built;
    }

    /// Replaces the desired value of `name`.
    ///
    /// The texture previously owned under `name` is queued for release unless
    /// the new value is the same handle.
    pub(crate) fn set(&mut self, name: &str, value: UniformInput, staging: &mut StagingQueue) {
        let incoming = value.as_texture();

        let previous = match self.actual.remove(name) {
            Some(actual) => actual.owned_texture(),
            None => None,
        }
        .or_else(|| self.desired.get(name).and_then(UniformInput::as_texture));

        if let Some(prev) = previous {
            if Some(prev) != incoming {
                staging.release(prev);
            }
        }
        if let Some(handle) = incoming {
            staging.cancel_release(handle);
        }

        *self.revisions.entry(name.to_string()).or_insert(0) += 1;
        self.failed.remove(name);
        self.declare(name, &value);

        if self.state == MapState::Built {
            match value.resolve_now() {
                Some(actual) => {
                    self.dirty.remove(name);
                    self.actual.insert(name.to_string(), actual);
                }
                None => {
                    self.dirty.insert(name.to_string());
                }
            }
        }

        self.desired.insert(name.to_string(), value);
    }

    /// Records the results of a finished load batch.
    pub(crate) fn accept_loads(&mut self, outcomes: Vec<LoadOutcome>, staging: &mut StagingQueue) {
        for LoadOutcome {
            name,
            revision,
            result,
        } in outcomes
        {
            if revision != self.revision(&name) {
                log::debug!("dropping superseded image load for uniform `{name}`");
                continue;
            }
            match result {
                Ok(source) => staging.create(StagedTexture {
                    name,
                    revision,
                    source,
                }),
                Err(err) => {
                    log::error!("failed to load image for uniform `{name}`: {err:#}");
                    self.failed.insert(name);
                }
            }
        }
    }

    /// Uploads staged images and binds them as materialized textures.
    pub(crate) fn create_staged(&mut self, device: &mut dyn GraphicsDevice, staging: &mut StagingQueue) {
        for StagedTexture {
            name,
            revision,
            source,
        } in staging.take_creates()
        {
            if revision != self.revision(&name) {
                log::debug!("skipping upload for superseded uniform `{name}`");
                continue;
            }

            match device.create_texture(&source) {
                Ok(info) => {
                    let replaced = self.actual.insert(
                        name,
                        ActualUniform::Texture {
                            handle: info.handle,
                            origin: TextureOrigin::Materialized,
                        },
                    );
                    if let Some(old) = replaced.and_then(|a| a.owned_texture()) {
                        if old != info.handle {
                            device.destroy_texture(old);
                        }
                    }
                }
                Err(err) => {
                    log::error!("failed to upload image for uniform `{name}`: {err:#}");
                    self.failed.insert(name);
                }
            }
        }
    }

    /// Resolves dirty uniforms, starting at most one load batch.
    ///
    /// Stage references bind immediately. URLs and images become loads. A
    /// stage reference to a stage the collection does not know stays dirty.
    pub(crate) fn dispatch_dirty(
        &mut self,
        stage_name: &str,
        collection: &dyn StageCollection,
        loader: &dyn ImageLoader,
        staging: &mut StagingQueue,
    ) {
        if self.dirty.is_empty() || staging.has_batch() {
            return;
        }

        let mut loads = Vec::new();
        let mut unresolved = BTreeSet::new();

        for name in std::mem::take(&mut self.dirty) {
            let Some(input) = self.desired.get(&name) else { continue };
            let revision = self.revision(&name);

            match input {
                UniformInput::Url(target) | UniformInput::Stage(target)
                    if target != stage_name && collection.contains_stage(target) =>
                {
                    self.actual
                        .insert(name, ActualUniform::StageOutput(target.clone()));
                }
                UniformInput::Url(url) => {
                    loads.push(PendingLoad::new(name, revision, loader.load(url)));
                }
                UniformInput::Image(source) => {
                    loads.push(PendingLoad::new(name, revision, imaging::ready(Ok(source.clone()))));
                }
                UniformInput::Stage(target) => {
                    log::debug!("uniform `{name}` waits for unknown stage `{target}`");
                    unresolved.insert(name);
                }
                _ => {}
            }
        }

        self.dirty = unresolved;

        if !loads.is_empty() {
            log::debug!("stage `{stage_name}` dispatching {} image load(s)", loads.len());
            staging.start_batch(LoadBatch::new(loads));
        }
    }

    /// Destroys every materialized texture and marks its uniform dirty.
    pub(crate) fn release_materialized(&mut self, device: &mut dyn GraphicsDevice) -> usize {
        let names: Vec<String> = self
            .actual
            .iter()
            .filter(|(_, a)| {
                matches!(
                    a,
                    ActualUniform::Texture {
                        origin: TextureOrigin::Materialized,
                        ..
                    }
                )
            })
            .map(|(n, _)| n.clone())
            .collect();

        for name in &names {
            if let Some(handle) = self.actual.remove(name).and_then(|a| a.owned_texture()) {
                device.destroy_texture(handle);
            }
            self.dirty.insert(name.clone());
        }

        names.len()
    }

    /// Destroys every texture the stage owns and forgets resolved state.
    pub(crate) fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        let mut owned: BTreeSet<TextureHandle> = self
            .actual
            .values()
            .filter_map(ActualUniform::owned_texture)
            .collect();
        owned.extend(self.desired.values().filter_map(UniformInput::as_texture));

        for handle in owned {
            device.destroy_texture(handle);
        }

        self.actual.clear();
        self.dirty.clear();
        self.failed.clear();
        self.state = MapState::Uninitialized;
    }
}
