use crate::coords::ColorRgba;

use super::TextureHandle;

/// Built-in binding holding the stage's input color texture.
pub const COLOR_TEXTURE: &str = "color_texture";

/// Built-in binding holding the stage's input depth texture.
pub const DEPTH_TEXTURE: &str = "depth_texture";

/// Shader-ready uniform value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Color(ColorRgba),
    Texture(TextureHandle),
}

impl UniformValue {
    #[inline]
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Bool(_) => UniformKind::Bool,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) | UniformValue::Color(_) => UniformKind::Vec4,
            UniformValue::Texture(_) => UniformKind::Texture,
        }
    }

    #[inline]
    pub fn as_texture(&self) -> Option<TextureHandle> {
        match self {
            UniformValue::Texture(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<ColorRgba> for UniformValue {
    fn from(v: ColorRgba) -> Self {
        UniformValue::Color(v)
    }
}

impl From<TextureHandle> for UniformValue {
    fn from(v: TextureHandle) -> Self {
        UniformValue::Texture(v)
    }
}

/// Shader-side type of a uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Texture,
}

/// Ordered uniform declarations a program is compiled against.
///
/// The built-in input bindings are not part of the layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    entries: Vec<(String, UniformKind)>,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a declaration, keeping entries sorted by name.
    pub fn insert(&mut self, name: impl Into<String>, kind: UniformKind) {
        let name = name.into();
        match self.entries.binary_search_by(|(n, _)| n.as_str().cmp(&name)) {
            Ok(i) => self.entries[i].1 = kind,
            Err(i) => self.entries.insert(i, (name, kind)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformKind)> {
        self.entries.iter().map(|(n, k)| (n.as_str(), *k))
    }

    pub fn kind(&self, name: &str) -> Option<UniformKind> {
        self.iter().find(|(n, _)| *n == name).map(|(_, k)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read side of a uniform binding table.
///
/// Values are produced on demand; implementations may evaluate callbacks or
/// consult other stages on every call.
pub trait UniformMap {
    fn value(&self, name: &str) -> Option<UniformValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stays_sorted_and_deduplicated() {
        let mut layout = UniformLayout::new();
        layout.insert("strength", UniformKind::Float);
        layout.insert("mask", UniformKind::Texture);
        layout.insert("strength", UniformKind::Vec2);

        let names: Vec<_> = layout.iter().collect();
        assert_eq!(
            names,
            vec![("mask", UniformKind::Texture), ("strength", UniformKind::Vec2)]
        );
    }

    #[test]
    fn color_is_a_vec4() {
        assert_eq!(UniformValue::from(ColorRgba::WHITE).kind(), UniformKind::Vec4);
    }
}
