use tracing::{debug, error};

use crate::compile::{compose_fragment, reflect_stage, StageReflection, VERTEX_SHADER_GLSL};
use crate::device::{GraphicsDevice, StageKind};
use crate::error::RendererError;
use crate::uniforms::ProgramBindings;

/// A compiled stage together with the interface naga reported for it.
pub struct CompiledStage<S> {
    pub handle: S,
    pub kind: StageKind,
    pub reflection: StageReflection,
}

/// Linked program plus the stages it was built from and its resolved
/// bindings. Exactly one exists per mounted instance.
pub struct ShaderProgram<D: GraphicsDevice> {
    pub program: D::Program,
    pub vertex: D::Stage,
    pub fragment: D::Stage,
    pub bindings: ProgramBindings,
}

impl<D: GraphicsDevice> ShaderProgram<D> {
    /// Releases the program, then the vertex and fragment stages.
    pub fn release(self, device: &mut D) {
        device.release_program(self.program);
        device.release_stage(self.vertex);
        device.release_stage(self.fragment);
    }
}

/// Compiles and links the noise-field program.
#[derive(Debug, Clone)]
pub struct ShaderProgramBuilder {
    vertex_source: String,
    fragment_source: String,
}

impl ShaderProgramBuilder {
    pub fn new(octaves: u32) -> Self {
        Self::from_sources(VERTEX_SHADER_GLSL, compose_fragment(octaves))
    }

    pub fn from_sources(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex_source: vertex.into(),
            fragment_source: fragment.into(),
        }
    }

    pub fn compile<D: GraphicsDevice>(
        device: &mut D,
        kind: StageKind,
        source: &str,
    ) -> Result<CompiledStage<D::Stage>, RendererError> {
        let reflection = reflect_stage(kind, source)?;
        let handle = device.compile_stage(kind, source)?;
        debug!(stage = %kind, inputs = reflection.inputs.len(), "compiled shader stage");
        Ok(CompiledStage {
            handle,
            kind,
            reflection,
        })
    }

    /// Links two compiled stages. On failure the stages are handed back to the
    /// caller untouched.
    pub fn link<D: GraphicsDevice>(
        device: &mut D,
        vertex: &CompiledStage<D::Stage>,
        fragment: &CompiledStage<D::Stage>,
    ) -> Result<(D::Program, ProgramBindings), RendererError> {
        let bindings = ProgramBindings::resolve(&vertex.reflection, &fragment.reflection)?;
        let program = device.link_program(&vertex.handle, &fragment.handle)?;
        Ok((program, bindings))
    }

    /// Compiles both stages and links them. Anything created before a failure
    /// is released before the error is returned.
    pub fn build<D: GraphicsDevice>(&self, device: &mut D) -> Result<ShaderProgram<D>, RendererError> {
        let vertex = Self::compile(device, StageKind::Vertex, &self.vertex_source)
            .inspect_err(|err| error!("{err}"))?;
        let fragment = match Self::compile(device, StageKind::Fragment, &self.fragment_source) {
            Ok(stage) => stage,
            Err(err) => {
                error!("{err}");
                device.release_stage(vertex.handle);
                return Err(err);
            }
        };
        match Self::link(device, &vertex, &fragment) {
            Ok((program, bindings)) => Ok(ShaderProgram {
                program,
                vertex: vertex.handle,
                fragment: fragment.handle,
                bindings,
            }),
            Err(err) => {
                error!("{err}");
                device.release_stage(vertex.handle);
                device.release_stage(fragment.handle);
                Err(err)
            }
        }
    }
}
