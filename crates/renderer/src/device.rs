//! Seams between the renderer's components and the graphics/windowing
//! backends.
//!
//! Components own no GPU state directly; they drive a [`GraphicsDevice`]. The
//! wgpu implementation lives in [`crate::gpu`], and tests swap in a recording
//! fake.

use std::fmt;

use winit::dpi::{LogicalSize, PhysicalSize};

use crate::error::RendererError;
use crate::uniforms::FrameUniforms;

/// Shader stage of a compiled unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub fn naga_stage(self) -> wgpu::naga::ShaderStage {
        match self {
            StageKind::Vertex => wgpu::naga::ShaderStage::Vertex,
            StageKind::Fragment => wgpu::naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Drawable region of the backing store, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn covering(size: PhysicalSize<u32>) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }
}

/// Result of starting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A target was acquired; the frame must be finished with `end_frame`.
    Ready,
    /// The target is temporarily unavailable; try again next tick.
    Skipped,
}

/// Window-like element the renderer draws into.
pub trait SurfaceHost {
    /// Displayed size in logical (CSS-like) pixels.
    fn display_size(&self) -> LogicalSize<f64>;

    /// Physical pixels per logical pixel.
    fn scale_factor(&self) -> f64;

    /// Backing-store size that keeps the drawing crisp on high-density
    /// displays.
    fn target_size(&self) -> PhysicalSize<u32> {
        self.display_size().to_physical(self.scale_factor())
    }
}

impl SurfaceHost for winit::window::Window {
    fn display_size(&self) -> LogicalSize<f64> {
        self.inner_size().to_logical(self.scale_factor())
    }

    fn scale_factor(&self) -> f64 {
        winit::window::Window::scale_factor(self)
    }

    fn target_size(&self) -> PhysicalSize<u32> {
        self.inner_size()
    }
}

/// Graphics operations the renderer's components need.
///
/// Handles are opaque to callers and are only valid on the device that
/// created them. Release calls consume the handle.
pub trait GraphicsDevice {
    type Stage;
    type Program;
    type Buffer;

    /// Current backing-store size.
    fn backing_size(&self) -> PhysicalSize<u32>;

    /// Resizes the backing store. Only called with non-zero sizes.
    fn configure_backing(&mut self, size: PhysicalSize<u32>);

    fn set_viewport(&mut self, viewport: Viewport);

    fn compile_stage(&mut self, kind: StageKind, source: &str)
        -> Result<Self::Stage, RendererError>;

    fn link_program(
        &mut self,
        vertex: &Self::Stage,
        fragment: &Self::Stage,
    ) -> Result<Self::Program, RendererError>;

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[[f32; 2]],
    ) -> Result<Self::Buffer, RendererError>;

    /// Uploads the per-frame uniform block of `program`.
    fn write_uniforms(&mut self, program: &Self::Program, uniforms: &FrameUniforms);

    /// Acquires the next target and clears it.
    fn begin_frame(&mut self, clear: [f64; 4]) -> Result<FrameStatus, RendererError>;

    fn use_program(&mut self, program: &Self::Program);

    fn bind_vertex_buffer(&mut self, buffer: &Self::Buffer);

    fn draw(&mut self, vertex_count: u32);

    /// Submits the frame started by `begin_frame` and presents it.
    fn end_frame(&mut self) -> Result<(), RendererError>;

    fn release_program(&mut self, program: Self::Program);

    fn release_stage(&mut self, stage: Self::Stage);

    fn release_buffer(&mut self, buffer: Self::Buffer);
}
