//! wgpu backend for [`crate::device::GraphicsDevice`].
//!
//! - `context` owns the instance, surface and device and reconfigures the
//!   swapchain on resize.
//! - `device` maps the trait's immediate-style calls onto one render pass per
//!   frame.

mod context;
mod device;

pub use device::{WgpuBuffer, WgpuDevice, WgpuProgram, WgpuStage};
