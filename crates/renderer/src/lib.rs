//! Animated fractal-noise background renderer.
//!
//! A full-screen quad is drawn every frame with a fragment stage that
//! evaluates multi-octave value noise, warps its domain by a slow drift and a
//! smoothed pointer position, and blends four color stops from the result.
//!
//! ```text
//!   host window ── SurfaceHost ──┐
//!                                ▼
//!   LifecycleController::mount ─▶ SurfaceManager ─▶ ShaderProgramBuilder ─▶ GeometryBuffer
//!          │                                                                  │
//!          ▼                                                                  ▼
//!   tick(): ensure_sized ─▶ PointerTracker::advance ─▶ UniformBinder ─▶ draw 6 vertices
//! ```
//!
//! Components speak to the GPU only through [`GraphicsDevice`]; [`gpu`]
//! implements it on wgpu. The same field is mirrored on the CPU in [`noise`]
//! for still export and tests.

mod compile;
mod device;
mod error;
mod export;
mod geometry;
pub mod gpu;
mod lifecycle;
pub mod noise;
mod pointer;
mod program;
mod render_loop;
mod runtime;
mod surface;
mod types;
mod uniforms;
mod window;

#[cfg(test)]
mod testing;

use anyhow::Result;

pub use compile::{
    compose_fragment, reflect_stage, StageReflection, UniformBlockReflection, VERTEX_SHADER_GLSL,
};
pub use device::{FrameStatus, GraphicsDevice, StageKind, SurfaceHost, Viewport};
pub use error::{FailureKind, RendererError};
pub use export::{export_png, render_still, StillRequest};
pub use geometry::{create_fullscreen_quad, GeometryHandle, FULLSCREEN_QUAD};
pub use lifecycle::{LifecycleController, MountStatus};
pub use noise::NoiseField;
pub use pointer::{advance_trail, PointerTracker, DEFAULT_TRAIL_RATE};
pub use program::{CompiledStage, ShaderProgram, ShaderProgramBuilder};
pub use render_loop::{LoopState, RenderLoop, TickOutcome};
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, FixedTimeSource, FrameScheduler, RenderPolicy,
    SystemTimeSource, TimeSample, TimeSource,
};
pub use surface::{RenderSurface, SurfaceManager};
pub use types::{
    DriftParams, FieldParams, GpuPowerPreference, RendererConfig, Rgb, COLOR_STOP_COUNT,
    DEFAULT_COLOR_STOPS, MAX_OCTAVES,
};
pub use uniforms::{
    FrameState, FrameUniforms, ProgramBindings, UniformBinder, POSITION_LOCATION, UNIFORM_BINDING,
    UNIFORM_GROUP, UNIFORM_LAYOUT,
};

/// Entry point used by the binary.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and animates until it is closed.
    pub fn run(self) -> Result<()> {
        window::run(self.config)
    }

    /// Renders one frame on the CPU and writes it as PNG.
    pub fn export_still(&self, request: &StillRequest, path: &std::path::Path) -> Result<()> {
        export_png(&self.config.params, request, path)
    }
}
