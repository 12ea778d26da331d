use std::collections::HashMap;

use anyhow::Result;

use crate::coords::Viewport;
use crate::device::{Framebuffer, GraphicsDevice, PixelDatatype, PixelFormat};
use crate::stage::StageCollection;

struct Target {
    framebuffer: Framebuffer,
    size: Viewport,
    format: PixelFormat,
    datatype: PixelDatatype,
}

/// Stage name → render target.
///
/// A registered stage may have no target yet (before the first update, or
/// while disabled).
#[derive(Default)]
pub(super) struct TargetRegistry {
    targets: HashMap<String, Option<Target>>,
}

impl TargetRegistry {
    pub(super) fn register(&mut self, name: &str) {
        self.targets.entry(name.to_string()).or_insert(None);
    }

    pub(super) fn unregister(&mut self, device: &mut dyn GraphicsDevice, name: &str) {
        self.release(device, name);
        self.targets.remove(name);
    }

    /// Allocates (or reallocates) the target of `name` unless it already
    /// matches the requested description.
    pub(super) fn ensure(
        &mut self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        size: Viewport,
        format: PixelFormat,
        datatype: PixelDatatype,
    ) -> Result<()> {
        let slot = self.targets.entry(name.to_string()).or_insert(None);

        if let Some(target) = slot {
            if target.size == size && target.format == format && target.datatype == datatype {
                return Ok(());
            }
            log::debug!(
                "target of `{name}` resized {}x{} -> {}x{}",
                target.size.width,
                target.size.height,
                size.width,
                size.height
            );
            device.destroy_framebuffer(target.framebuffer.id);
            *slot = None;
        }

        let framebuffer = device.create_framebuffer(size, format, datatype)?;
        *slot = Some(Target {
            framebuffer,
            size,
            format,
            datatype,
        });
        Ok(())
    }

    /// Destroys the target of `name`, keeping the stage registered.
    pub(super) fn release(&mut self, device: &mut dyn GraphicsDevice, name: &str) {
        if let Some(target) = self.targets.get_mut(name).and_then(Option::take) {
            device.destroy_framebuffer(target.framebuffer.id);
        }
    }

    pub(super) fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        for target in self.targets.drain().filter_map(|(_, t)| t) {
            device.destroy_framebuffer(target.framebuffer.id);
        }
    }
}

impl StageCollection for TargetRegistry {
    fn framebuffer(&self, name: &str) -> Option<Framebuffer> {
        let target = self.targets.get(name)?.as_ref()?;
        Some(target.framebuffer.clone())
    }

    fn contains_stage(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }
}
