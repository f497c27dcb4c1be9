//! Recording fakes for exercising components without a GPU.

use std::cell::RefCell;
use std::rc::Rc;

use winit::dpi::{LogicalSize, PhysicalSize};

use crate::device::{FrameStatus, GraphicsDevice, StageKind, SurfaceHost, Viewport};
use crate::error::RendererError;
use crate::uniforms::FrameUniforms;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ConfigureBacking(u32, u32),
    SetViewport(Viewport),
    CompileStage(StageKind, u32),
    LinkProgram(u32),
    CreateVertexBuffer(u32, usize),
    /// Program handle and the uploaded time.
    WriteUniforms(u32, f32),
    BeginFrame,
    UseProgram(u32),
    BindVertexBuffer(u32),
    Draw(u32),
    EndFrame,
    ReleaseProgram(u32),
    ReleaseStage(u32),
    ReleaseBuffer(u32),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Device that hands out integer handles and records every call.
#[derive(Debug)]
pub struct RecordingDevice {
    log: CallLog,
    next_handle: u32,
    backing: PhysicalSize<u32>,
    pub fail_compile: Option<StageKind>,
    pub fail_link: bool,
    pub fail_buffer: bool,
    pub fail_frame: bool,
    pub frame_status: FrameStatus,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            next_handle: 1,
            backing: PhysicalSize::new(0, 0),
            fail_compile: None,
            fail_link: false,
            fail_buffer: false,
            fail_frame: false,
            frame_status: FrameStatus::Ready,
        }
    }

    pub fn log(&self) -> CallLog {
        Rc::clone(&self.log)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    /// Allocates a program handle without recording a link.
    pub fn fake_program(&mut self) -> u32 {
        self.handle()
    }

    fn handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl GraphicsDevice for RecordingDevice {
    type Stage = u32;
    type Program = u32;
    type Buffer = u32;

    fn backing_size(&self) -> PhysicalSize<u32> {
        self.backing
    }

    fn configure_backing(&mut self, size: PhysicalSize<u32>) {
        self.backing = size;
        self.record(Call::ConfigureBacking(size.width, size.height));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.record(Call::SetViewport(viewport));
    }

    fn compile_stage(&mut self, kind: StageKind, _source: &str) -> Result<u32, RendererError> {
        if self.fail_compile == Some(kind) {
            return Err(RendererError::Compile {
                stage: kind,
                diagnostics: "injected compile failure".to_string(),
            });
        }
        let handle = self.handle();
        self.record(Call::CompileStage(kind, handle));
        Ok(handle)
    }

    fn link_program(&mut self, _vertex: &u32, _fragment: &u32) -> Result<u32, RendererError> {
        if self.fail_link {
            return Err(RendererError::Link {
                diagnostics: "injected link failure".to_string(),
            });
        }
        let handle = self.handle();
        self.record(Call::LinkProgram(handle));
        Ok(handle)
    }

    fn create_vertex_buffer(
        &mut self,
        _label: &str,
        vertices: &[[f32; 2]],
    ) -> Result<u32, RendererError> {
        if self.fail_buffer {
            return Err(RendererError::ResourceAcquisition(
                "injected buffer failure".to_string(),
            ));
        }
        let handle = self.handle();
        self.record(Call::CreateVertexBuffer(handle, vertices.len()));
        Ok(handle)
    }

    fn write_uniforms(&mut self, program: &u32, uniforms: &FrameUniforms) {
        self.record(Call::WriteUniforms(*program, uniforms.time));
    }

    fn begin_frame(&mut self, _clear: [f64; 4]) -> Result<FrameStatus, RendererError> {
        if self.fail_frame {
            return Err(RendererError::Frame("injected frame failure".to_string()));
        }
        self.record(Call::BeginFrame);
        Ok(self.frame_status)
    }

    fn use_program(&mut self, program: &u32) {
        self.record(Call::UseProgram(*program));
    }

    fn bind_vertex_buffer(&mut self, buffer: &u32) {
        self.record(Call::BindVertexBuffer(*buffer));
    }

    fn draw(&mut self, vertex_count: u32) {
        self.record(Call::Draw(vertex_count));
    }

    fn end_frame(&mut self) -> Result<(), RendererError> {
        self.record(Call::EndFrame);
        Ok(())
    }

    fn release_program(&mut self, program: u32) {
        self.record(Call::ReleaseProgram(program));
    }

    fn release_stage(&mut self, stage: u32) {
        self.record(Call::ReleaseStage(stage));
    }

    fn release_buffer(&mut self, buffer: u32) {
        self.record(Call::ReleaseBuffer(buffer));
    }
}

/// Host with a settable displayed size.
#[derive(Debug, Clone, Copy)]
pub struct FakeHost {
    pub size: LogicalSize<f64>,
    pub scale: f64,
}

impl FakeHost {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: LogicalSize::new(width, height),
            scale: 1.0,
        }
    }
}

impl SurfaceHost for FakeHost {
    fn display_size(&self) -> LogicalSize<f64> {
        self.size
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }
}
