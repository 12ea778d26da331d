//! Prism engine crate.
//!
//! Screen-space post-processing stages on top of a pluggable graphics device.
//! A [`stage::PostStage`] owns one fragment program and its uniforms; a
//! [`chain::StageChain`] owns stages and their render targets; the
//! [`device::WgpuDevice`] backend draws them with wgpu.

pub mod chain;
pub mod coords;
pub mod device;
pub mod imaging;
pub mod logging;
pub mod stage;

#[cfg(test)]
mod testing;
