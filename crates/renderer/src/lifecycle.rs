use tracing::{error, info, warn};

use crate::device::{GraphicsDevice, SurfaceHost};
use crate::error::{FailureKind, RendererError};
use crate::geometry::create_fullscreen_quad;
use crate::pointer::PointerTracker;
use crate::program::ShaderProgramBuilder;
use crate::render_loop::{self, Instance, RenderLoop, TickOutcome};
use crate::runtime::BoxedTimeSource;
use crate::surface::SurfaceManager;
use crate::types::FieldParams;
use crate::uniforms::UniformBinder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    Running,
    /// Mount or a later frame failed; the renderer draws nothing.
    Inert(FailureKind),
    Unmounted,
}

/// Owns one mounted renderer from initialization to teardown.
///
/// Mounting never fails towards the host. Teardown is idempotent and also
/// runs on drop.
pub struct LifecycleController<D: GraphicsDevice> {
    instance: Option<Instance<D>>,
    status: MountStatus,
}

impl<D: GraphicsDevice> LifecycleController<D> {
    /// Acquires a device for `host`, builds every GPU object and starts the
    /// loop. On any failure the objects created so far are released and the
    /// controller settles in [`MountStatus::Inert`].
    pub fn mount<H, F>(host: &H, params: &FieldParams, clock: BoxedTimeSource, acquire: F) -> Self
    where
        H: SurfaceHost + ?Sized,
        F: FnOnce(&H) -> Result<D, RendererError>,
    {
        match Self::initialise(host, params, clock, acquire) {
            Ok(instance) => {
                let size = instance.surface.surface().size;
                info!(
                    width = size.width,
                    height = size.height,
                    octaves = params.clamped_octaves(),
                    "renderer mounted"
                );
                Self {
                    instance: Some(instance),
                    status: MountStatus::Running,
                }
            }
            Err(err) => {
                match err.kind() {
                    FailureKind::UnsupportedEnvironment => {
                        warn!("renderer disabled, no usable GPU context: {err}")
                    }
                    _ => error!("renderer failed to initialise: {err}"),
                }
                Self {
                    instance: None,
                    status: MountStatus::Inert(err.kind()),
                }
            }
        }
    }

    fn initialise<H, F>(
        host: &H,
        params: &FieldParams,
        clock: BoxedTimeSource,
        acquire: F,
    ) -> Result<Instance<D>, RendererError>
    where
        H: SurfaceHost + ?Sized,
        F: FnOnce(&H) -> Result<D, RendererError>,
    {
        let mut device = acquire(host)?;
        let mut surface = SurfaceManager::new(&device);
        surface.ensure_sized(host, &mut device);

        let program = ShaderProgramBuilder::new(params.octaves).build(&mut device)?;
        let geometry = match create_fullscreen_quad(&mut device) {
            Ok(geometry) => geometry,
            Err(err) => {
                program.release(&mut device);
                return Err(err);
            }
        };

        let mut pointer = PointerTracker::new(params.trail_rate);
        pointer.register_listener();
        let binder = UniformBinder::new(params, program.bindings);
        let mut render_loop = RenderLoop::new();
        render_loop.schedule();

        Ok(Instance {
            device,
            surface,
            program,
            geometry,
            pointer,
            binder,
            clock,
            render_loop,
        })
    }

    pub fn status(&self) -> MountStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.instance
            .as_ref()
            .is_some_and(|instance| instance.render_loop.is_running())
    }

    pub fn device(&self) -> Option<&D> {
        self.instance.as_ref().map(|instance| &instance.device)
    }

    pub fn pointer_trail(&self) -> Option<[f32; 2]> {
        self.instance.as_ref().map(|instance| instance.pointer.trail())
    }

    /// Forwards a pointer event in surface pixels (top-left origin).
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if let Some(instance) = self.instance.as_mut() {
            let bounds = instance.surface.surface().size;
            instance.pointer.on_pointer_move(x, y, bounds);
        }
    }

    /// Runs one frame. A frame failure tears the instance down.
    pub fn tick<H: SurfaceHost + ?Sized>(&mut self, host: &H) -> TickOutcome {
        let Some(instance) = self.instance.as_mut() else {
            return TickOutcome::Stopped;
        };
        match render_loop::tick(instance, host) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("render loop stopped: {err}");
                self.release();
                self.status = MountStatus::Inert(err.kind());
                TickOutcome::Stopped
            }
        }
    }

    /// Cancels the loop and releases every GPU object. Safe to call any
    /// number of times.
    pub fn unmount(&mut self) {
        if let Some(frames) = self.release() {
            info!(frames, "renderer unmounted");
        }
        if self.status == MountStatus::Running {
            self.status = MountStatus::Unmounted;
        }
    }

    /// Tears the instance down, returning how many frames it drew.
    fn release(&mut self) -> Option<u64> {
        let instance = self.instance.take()?;
        let frames = instance.render_loop.frame_count();
        drop(instance.teardown());
        Some(frames)
    }
}

impl<D: GraphicsDevice> Drop for LifecycleController<D> {
    fn drop(&mut self) {
        self.unmount();
    }
}
