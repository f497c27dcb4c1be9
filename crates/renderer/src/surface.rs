use tracing::debug;
use winit::dpi::PhysicalSize;

use crate::device::{GraphicsDevice, SurfaceHost, Viewport};

/// Backing-store dimensions as last applied to the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSurface {
    pub size: PhysicalSize<u32>,
    pub scale_factor: f64,
}

/// Keeps the backing store in step with the host's displayed size.
#[derive(Debug, Clone)]
pub struct SurfaceManager {
    surface: RenderSurface,
}

impl SurfaceManager {
    pub fn new<D: GraphicsDevice>(device: &D) -> Self {
        Self {
            surface: RenderSurface {
                size: device.backing_size(),
                scale_factor: 1.0,
            },
        }
    }

    pub fn surface(&self) -> RenderSurface {
        self.surface
    }

    pub fn resolution(&self) -> [f32; 2] {
        [self.surface.size.width as f32, self.surface.size.height as f32]
    }

    /// Resizes the backing store and viewport when the host's target size
    /// changed. Returns whether anything was reconfigured.
    pub fn ensure_sized<H, D>(&mut self, host: &H, device: &mut D) -> bool
    where
        H: SurfaceHost + ?Sized,
        D: GraphicsDevice,
    {
        let target = host.target_size();
        self.surface.scale_factor = host.scale_factor();
        if target.width == 0 || target.height == 0 || target == self.surface.size {
            return false;
        }
        debug!(
            from = ?(self.surface.size.width, self.surface.size.height),
            to = ?(target.width, target.height),
            scale = self.surface.scale_factor,
            "resizing backing store"
        );
        device.configure_backing(target);
        device.set_viewport(Viewport::covering(target));
        self.surface.size = target;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeHost, RecordingDevice};

    #[test]
    fn resizes_backing_store_and_viewport_together() {
        let mut device = RecordingDevice::new();
        let mut host = FakeHost::new(800.0, 600.0);
        let mut manager = SurfaceManager::new(&device);

        assert!(manager.ensure_sized(&host, &mut device));
        assert!(!manager.ensure_sized(&host, &mut device));

        host.size = winit::dpi::LogicalSize::new(1200.0, 800.0);
        assert!(manager.ensure_sized(&host, &mut device));
        assert_eq!(manager.surface().size, PhysicalSize::new(1200, 800));
        assert_eq!(device.backing_size(), PhysicalSize::new(1200, 800));
        assert_eq!(
            device.calls()[2..],
            [
                Call::ConfigureBacking(1200, 800),
                Call::SetViewport(Viewport {
                    x: 0,
                    y: 0,
                    width: 1200,
                    height: 800,
                }),
            ]
        );
    }

    #[test]
    fn scales_by_device_pixel_ratio() {
        let mut device = RecordingDevice::new();
        let mut host = FakeHost::new(640.0, 360.0);
        host.scale = 2.0;
        let mut manager = SurfaceManager::new(&device);

        manager.ensure_sized(&host, &mut device);
        assert_eq!(manager.resolution(), [1280.0, 720.0]);
        assert_eq!(manager.surface().scale_factor, 2.0);
    }

    #[test]
    fn skips_zero_area_targets() {
        let mut device = RecordingDevice::new();
        let host = FakeHost::new(0.0, 600.0);
        let mut manager = SurfaceManager::new(&device);

        assert!(!manager.ensure_sized(&host, &mut device));
        assert!(device.calls().is_empty());
    }
}
