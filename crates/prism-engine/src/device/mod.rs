//! Graphics device seam and its wgpu implementation.
//!
//! This module is responsible for:
//! - plain handle/value types shared by stages and devices
//! - the [`GraphicsDevice`] trait stages and collections render through
//! - [`WgpuDevice`], a headless wgpu backend for that trait

mod command;
mod gpu;
mod graphics;
mod init;
mod shader;
mod types;
mod uniform;

pub use command::DrawCommand;
pub use gpu::WgpuDevice;
pub use graphics::GraphicsDevice;
pub use init::DeviceInit;
pub use types::{
    Framebuffer, FramebufferId, PassState, PixelDatatype, PixelFormat, ProgramHandle, RenderState,
    Sampler, TextureFilter, TextureHandle, TextureInfo, TextureWrap,
};
pub use uniform::{COLOR_TEXTURE, DEPTH_TEXTURE, UniformKind, UniformLayout, UniformMap, UniformValue};
