//! WGSL generation for viewport-quad programs.
//!
//! Every program is `prelude + fragment source`. The prelude declares the
//! full-screen vertex stage and all bindings; the fragment source must define
//!
//! ```wgsl
//! @fragment
//! fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> { ... }
//! ```
//!
//! Bind group 0:
//! - 0: `color_texture`, 1: `color_sampler`, 2: `depth_texture`
//! - 3: `u`, one `@align(16)` member per scalar/vector uniform (omitted when there are none)
//! - 4..: `<name>` / `<name>_sampler` pairs, one per texture uniform
//!
//! Booleans are declared as `u32` (0 or 1); WGSL `bool` is not host-shareable.

use anyhow::Result;

use super::{COLOR_TEXTURE, DEPTH_TEXTURE, UniformKind, UniformLayout, UniformMap, UniformValue};

pub(crate) const COLOR_BINDING: u32 = 0;
pub(crate) const COLOR_SAMPLER_BINDING: u32 = 1;
pub(crate) const DEPTH_BINDING: u32 = 2;
pub(crate) const UNIFORM_BLOCK_BINDING: u32 = 3;
const FIRST_TEXTURE_BINDING: u32 = 4;

const COLOR_SAMPLER: &str = "color_sampler";
const UNIFORM_BLOCK: &str = "u";
const SAMPLER_SUFFIX: &str = "_sampler";

const RESERVED: &[&str] = &[
    COLOR_TEXTURE,
    COLOR_SAMPLER,
    DEPTH_TEXTURE,
    UNIFORM_BLOCK,
    "PostUniforms",
    "VertexOutput",
    "vs_main",
    "fs_main",
    "alias", "break", "case", "const", "const_assert", "continue", "continuing",
    "default", "diagnostic", "discard", "else", "enable", "false", "fn", "for",
    "if", "let", "loop", "override", "requires", "return", "struct", "switch",
    "true", "var", "while",
];

const VERTEX_STAGE: &str = r#"struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}
"#;

/// One 16-byte slot of the uniform block.
pub(crate) type UniformSlot = [f32; 4];

/// Binding plan derived from a [`UniformLayout`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProgramLayout {
    block: Vec<(String, UniformKind)>,
    textures: Vec<String>,
}

impl ProgramLayout {
    pub(crate) fn new(layout: &UniformLayout) -> Result<Self> {
        let mut block = Vec::new();
        let mut textures = Vec::new();

        for (name, kind) in layout.iter() {
            validate_identifier(name)?;
            match kind {
                UniformKind::Texture => textures.push(name.to_string()),
                _ => block.push((name.to_string(), kind)),
            }
        }

        for texture in &textures {
            let sampler = format!("{texture}{SAMPLER_SUFFIX}");
            anyhow::ensure!(
                layout.kind(&sampler).is_none(),
                "uniform `{sampler}` collides with the sampler generated for `{texture}`"
            );
        }

        Ok(Self { block, textures })
    }

    #[inline]
    pub(crate) fn has_block(&self) -> bool {
        !self.block.is_empty()
    }

    pub(crate) fn block_size(&self) -> u64 {
        (self.block.len() * std::mem::size_of::<UniformSlot>()) as u64
    }

    /// Texture uniforms with their texture binding; the sampler sits at `binding + 1`.
    pub(crate) fn textures(&self) -> impl Iterator<Item = (&str, u32)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), FIRST_TEXTURE_BINDING + 2 * i as u32))
    }

    /// Full program source.
    pub(crate) fn source(&self, fragment_source: &str) -> String {
        let mut out = String::from(VERTEX_STAGE);

        out.push('\n');
        out.push_str(&format!(
            "@group(0) @binding({COLOR_BINDING}) var {COLOR_TEXTURE}: texture_2d<f32>;\n"
        ));
        out.push_str(&format!(
            "@group(0) @binding({COLOR_SAMPLER_BINDING}) var {COLOR_SAMPLER}: sampler;\n"
        ));
        out.push_str(&format!(
            "@group(0) @binding({DEPTH_BINDING}) var {DEPTH_TEXTURE}: texture_2d<f32>;\n"
        ));

        if self.has_block() {
            out.push_str("\nstruct PostUniforms {\n");
            for (name, kind) in &self.block {
                out.push_str(&format!("    @align(16) {name}: {},\n", wgsl_type(*kind)));
            }
            out.push_str("};\n");
            out.push_str(&format!(
                "@group(0) @binding({UNIFORM_BLOCK_BINDING}) var<uniform> {UNIFORM_BLOCK}: PostUniforms;\n"
            ));
        }

        for (name, binding) in self.textures() {
            out.push_str(&format!(
                "@group(0) @binding({binding}) var {name}: texture_2d<f32>;\n"
            ));
            out.push_str(&format!(
                "@group(0) @binding({}) var {name}{SAMPLER_SUFFIX}: sampler;\n",
                binding + 1
            ));
        }

        out.push('\n');
        out.push_str(fragment_source);
        out
    }

    /// Reads every block member from `uniforms` into its slot.
    ///
    /// Missing or mistyped values are zeroed.
    pub(crate) fn pack(&self, uniforms: &dyn UniformMap) -> Vec<UniformSlot> {
        self.block
            .iter()
            .map(|(name, kind)| match uniforms.value(name) {
                Some(value) => slot(*kind, value).unwrap_or_else(|| {
                    log::warn!("uniform `{name}` expected {kind:?}, got {value:?}; zeroed");
                    [0.0; 4]
                }),
                None => {
                    log::debug!("uniform `{name}` has no value; zeroed");
                    [0.0; 4]
                }
            })
            .collect()
    }
}

fn wgsl_type(kind: UniformKind) -> &'static str {
    match kind {
        UniformKind::Float => "f32",
        UniformKind::Int => "i32",
        UniformKind::Bool => "u32",
        UniformKind::Vec2 => "vec2<f32>",
        UniformKind::Vec3 => "vec3<f32>",
        UniformKind::Vec4 => "vec4<f32>",
        UniformKind::Texture => "texture_2d<f32>",
    }
}

fn slot(kind: UniformKind, value: UniformValue) -> Option<UniformSlot> {
    Some(match (kind, value) {
        (UniformKind::Float, UniformValue::Float(v)) => [v, 0.0, 0.0, 0.0],
        (UniformKind::Int, UniformValue::Int(v)) => [bytemuck::cast(v), 0.0, 0.0, 0.0],
        (UniformKind::Bool, UniformValue::Bool(b)) => [bytemuck::cast(u32::from(b)), 0.0, 0.0, 0.0],
        (UniformKind::Vec2, UniformValue::Vec2([x, y])) => [x, y, 0.0, 0.0],
        (UniformKind::Vec3, UniformValue::Vec3([x, y, z])) => [x, y, z, 0.0],
        (UniformKind::Vec4, UniformValue::Vec4(v)) => v,
        (UniformKind::Vec4, UniformValue::Color(c)) => c.to_array(),
        _ => return None,
    })
}

fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    anyhow::ensure!(
        valid && name != "_" && !name.starts_with("__"),
        "uniform name `{name}` is not a valid WGSL identifier"
    );
    anyhow::ensure!(!RESERVED.contains(&name), "uniform name `{name}` is reserved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::coords::ColorRgba;
    use crate::device::TextureHandle;

    struct Table(HashMap<&'static str, UniformValue>);

    impl UniformMap for Table {
        fn value(&self, name: &str) -> Option<UniformValue> {
            self.0.get(name).copied()
        }
    }

    fn layout(entries: &[(&str, UniformKind)]) -> UniformLayout {
        let mut l = UniformLayout::new();
        for (name, kind) in entries {
            l.insert(*name, *kind);
        }
        l
    }

    #[test]
    fn builtins_are_always_declared() {
        let src = ProgramLayout::new(&UniformLayout::new()).unwrap().source("// body");
        assert!(src.contains("var color_texture: texture_2d<f32>;"));
        assert!(src.contains("var color_sampler: sampler;"));
        assert!(src.contains("var depth_texture: texture_2d<f32>;"));
        assert!(!src.contains("var<uniform>"));
        assert!(src.ends_with("// body"));
    }

    #[test]
    fn scalars_go_to_the_block_and_textures_get_bindings() {
        let l = layout(&[
            ("strength", UniformKind::Float),
            ("mask", UniformKind::Texture),
            ("tint", UniformKind::Vec4),
            ("noise", UniformKind::Texture),
        ]);
        let p = ProgramLayout::new(&l).unwrap();
        assert_eq!(p.block_size(), 32);

        let bindings: Vec<_> = p.textures().collect();
        assert_eq!(bindings, vec![("mask", 4), ("noise", 6)]);

        let src = p.source("");
        assert!(src.contains("@align(16) strength: f32,"));
        assert!(src.contains("@align(16) tint: vec4<f32>,"));
        assert!(src.contains("@binding(3) var<uniform> u: PostUniforms;"));
        assert!(src.contains("@binding(5) var mask_sampler: sampler;"));
    }

    #[test]
    fn pack_follows_layout_order() {
        let l = layout(&[
            ("b_flag", UniformKind::Bool),
            ("a_count", UniformKind::Int),
            ("c_tint", UniformKind::Vec4),
            ("d_missing", UniformKind::Vec2),
        ]);
        let p = ProgramLayout::new(&l).unwrap();
        let table = Table(HashMap::from([
            ("a_count", UniformValue::Int(-3)),
            ("b_flag", UniformValue::Bool(true)),
            ("c_tint", UniformValue::Color(ColorRgba::WHITE)),
        ]));

        let slots = p.pack(&table);
        assert_eq!(slots.len(), 4);
        assert_eq!(bytemuck::cast::<f32, i32>(slots[0][0]), -3);
        assert_eq!(bytemuck::cast::<f32, u32>(slots[1][0]), 1);
        assert_eq!(slots[2], [1.0; 4]);
        assert_eq!(slots[3], [0.0; 4]);
    }

    #[test]
    fn mistyped_value_is_zeroed() {
        let p = ProgramLayout::new(&layout(&[("gain", UniformKind::Float)])).unwrap();
        let table = Table(HashMap::from([("gain", UniformValue::Texture(TextureHandle::from_raw(1)))]));
        assert_eq!(p.pack(&table), vec![[0.0; 4]]);
    }

    #[test]
    fn bad_identifiers_are_rejected() {
        for name in ["", "1abc", "has space", "__x", "fn", "color_texture", "u"] {
            let l = layout(&[(name, UniformKind::Float)]);
            assert!(ProgramLayout::new(&l).is_err(), "{name:?} accepted");
        }
    }

    #[test]
    fn generated_sampler_names_cannot_collide() {
        let l = layout(&[("mask", UniformKind::Texture), ("mask_sampler", UniformKind::Float)]);
        assert!(ProgramLayout::new(&l).is_err());
    }
}
