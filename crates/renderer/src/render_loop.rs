use std::time::{Duration, Instant};

use tracing::debug;

use crate::device::{FrameStatus, GraphicsDevice, SurfaceHost};
use crate::error::RendererError;
use crate::geometry::GeometryHandle;
use crate::pointer::PointerTracker;
use crate::program::ShaderProgram;
use crate::runtime::{BoxedTimeSource, TimeSample};
use crate::surface::SurfaceManager;
use crate::uniforms::{FrameState, UniformBinder};

/// Cleared to before every draw; the quad overwrites all of it.
pub const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// What a tick did, and therefore whether another should be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    /// No target was available; the frame is dropped, not retried.
    Skipped,
    Stopped,
}

impl TickOutcome {
    pub fn reschedule(self) -> bool {
        !matches!(self, TickOutcome::Stopped)
    }
}

/// Self-rescheduling frame loop reduced to a state record.
///
/// Only the lifecycle controller cancels it; once stopped it never re-arms.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    cancelled: bool,
    frame_count: u64,
    frames_since_last_update: u32,
    last_fps_update: Instant,
    frames_per_second: f32,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
            cancelled: false,
            frame_count: 0,
            frames_since_last_update: 0,
            last_fps_update: Instant::now(),
            frames_per_second: 0.0,
        }
    }

    /// Arms the loop. Has no effect after [`RenderLoop::cancel`].
    pub fn schedule(&mut self) {
        if !self.cancelled && self.state == LoopState::Stopped {
            self.state = LoopState::Running;
            self.last_fps_update = Instant::now();
        }
    }

    pub fn cancel(&mut self) {
        self.state = LoopState::Stopped;
        self.cancelled = true;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn record_frame(&mut self, sample: TimeSample) {
        self.frame_count = self.frame_count.saturating_add(1);
        self.frames_since_last_update += 1;

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.frame_count,
                time = sample.seconds,
                "render stats"
            );
        }
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one mounted renderer owns.
pub struct Instance<D: GraphicsDevice> {
    pub device: D,
    pub surface: SurfaceManager,
    pub program: ShaderProgram<D>,
    pub geometry: GeometryHandle<D::Buffer>,
    pub pointer: PointerTracker,
    pub binder: UniformBinder,
    pub clock: BoxedTimeSource,
    pub render_loop: RenderLoop,
}

impl<D: GraphicsDevice> Instance<D> {
    /// Cancels the loop, detaches the pointer, then releases the program,
    /// both stages and the quad buffer. Returns the device so the caller
    /// decides when the context itself goes away.
    pub fn teardown(self) -> D {
        let Instance {
            mut device,
            program,
            geometry,
            mut pointer,
            mut render_loop,
            ..
        } = self;
        render_loop.cancel();
        pointer.remove_listener();
        program.release(&mut device);
        geometry.release(&mut device);
        device
    }
}

/// Draws one frame if the loop is running.
pub fn tick<D, H>(instance: &mut Instance<D>, host: &H) -> Result<TickOutcome, RendererError>
where
    D: GraphicsDevice,
    H: SurfaceHost + ?Sized,
{
    if !instance.render_loop.is_running() {
        return Ok(TickOutcome::Stopped);
    }

    instance.surface.ensure_sized(host, &mut instance.device);
    let pointer_trail = instance.pointer.advance();
    let sample = instance.clock.sample();

    if instance.device.begin_frame(CLEAR_COLOR)? == FrameStatus::Skipped {
        return Ok(TickOutcome::Skipped);
    }

    let program = &instance.program.program;
    instance.device.use_program(program);
    instance.binder.bind_frame(
        &mut instance.device,
        program,
        &FrameState {
            elapsed_seconds: sample.seconds,
            resolution: instance.surface.resolution(),
            pointer_trail,
        },
    );
    instance.geometry.bind(&mut instance.device);
    instance.device.draw(instance.geometry.vertex_count());
    instance.device.end_frame()?;

    instance.render_loop.record_frame(sample);
    Ok(TickOutcome::Rendered)
}
