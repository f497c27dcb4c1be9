use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::gpu::WgpuDevice;
use crate::lifecycle::{LifecycleController, MountStatus};
use crate::runtime::{time_source_for_policy, FrameScheduler, RenderPolicy};
use crate::types::RendererConfig;

/// Opens a window, mounts the renderer into it and runs until the window is
/// closed. A missing GPU leaves the window blank instead of failing.
pub(crate) fn run(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let policy = RenderPolicy::Animate {
        target_fps: config.target_fps,
    };
    let mut scheduler = FrameScheduler::from_policy(&policy);
    let power = config.power;
    let vsync = config.vsync;
    let surface_window = Arc::clone(&window);
    let mut controller = LifecycleController::mount(
        window.as_ref(),
        &config.params,
        time_source_for_policy(&policy),
        move |host| WgpuDevice::new(surface_window, host.inner_size(), power, vsync),
    );
    if let MountStatus::Inert(kind) = controller.status() {
        if kind.is_instance_fault() {
            warn!(?kind, "renderer failed; window stays blank");
        } else {
            info!(?kind, "no GPU available; running without animation");
        }
    }
    if controller.is_running() {
        window.request_redraw();
    }

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    controller.unmount();
                    elwt.exit();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    controller.pointer_moved(position.x, position.y);
                }
                WindowEvent::Resized(new_size) => {
                    debug!(width = new_size.width, height = new_size.height, "window resized");
                    if controller.is_running() {
                        window.request_redraw();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let outcome = controller.tick(window.as_ref());
                    scheduler.mark_rendered(Instant::now());
                    if !outcome.reschedule() {
                        debug!("render loop stopped");
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if !controller.is_running() {
                    elwt.set_control_flow(ControlFlow::Wait);
                    return;
                }
                let now = Instant::now();
                if scheduler.ready_for_frame(now) {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = scheduler.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            Event::LoopExiting => {
                controller.unmount();
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
