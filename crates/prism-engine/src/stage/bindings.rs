use std::collections::HashMap;

use crate::device::{COLOR_TEXTURE, DEPTH_TEXTURE, TextureHandle, UniformMap, UniformValue};

use super::collection::StageCollection;
use super::uniforms::ActualUniform;

/// Uniform table handed to the device for one execution.
///
/// Every lookup evaluates the binding afresh: callbacks run and chained
/// stage outputs are fetched from the collection.
pub(crate) struct UniformBindings<'a> {
    actual: &'a HashMap<String, ActualUniform>,
    collection: &'a dyn StageCollection,
    color_texture: Option<TextureHandle>,
    depth_texture: Option<TextureHandle>,
}

impl<'a> UniformBindings<'a> {
    pub(crate) fn new(
        actual: &'a HashMap<String, ActualUniform>,
        collection: &'a dyn StageCollection,
        color_texture: Option<TextureHandle>,
        depth_texture: Option<TextureHandle>,
    ) -> Self {
        Self {
            actual,
            collection,
            color_texture,
            depth_texture,
        }
    }
}

impl UniformMap for UniformBindings<'_> {
    fn value(&self, name: &str) -> Option<UniformValue> {
        match name {
            COLOR_TEXTURE => self.color_texture.map(UniformValue::Texture),
            DEPTH_TEXTURE => self.depth_texture.map(UniformValue::Texture),
            _ => self.actual.get(name)?.read(self.collection),
        }
    }
}
