use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::compile::StageReflection;
use crate::device::GraphicsDevice;
use crate::error::RendererError;
use crate::types::FieldParams;

/// Vertex attribute location of the quad's `position` input.
pub const POSITION_LOCATION: u32 = 0;
/// Bind group holding the uniform block.
pub const UNIFORM_GROUP: u32 = 0;
/// Binding of the uniform block inside [`UNIFORM_GROUP`].
pub const UNIFORM_BINDING: u32 = 0;

/// Host mirror of the fragment stage's std140 `FieldUniforms` block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub resolution: [f32; 2],
    pub pointer: [f32; 2],
    pub time: f32,
    pub pointer_falloff: f32,
    pub pointer_strength: f32,
    pub scale: f32,
    pub color_stops: [[f32; 4]; 4],
    /// Stop weights in `xyz`; `w` unused.
    pub stop_weights: [f32; 4],
    /// `speed, sway, frequency.x, frequency.y`.
    pub drift: [f32; 4],
    /// `shimmer, gradient_floor, shimmer_frequency, unused`.
    pub shading: [f32; 4],
}

/// GLSL member name and host byte offset of every uniform, in block order.
pub const UNIFORM_LAYOUT: [(&str, usize); 10] = [
    ("u_resolution", offset_of!(FrameUniforms, resolution)),
    ("u_pointer", offset_of!(FrameUniforms, pointer)),
    ("u_time", offset_of!(FrameUniforms, time)),
    ("u_pointer_falloff", offset_of!(FrameUniforms, pointer_falloff)),
    ("u_pointer_strength", offset_of!(FrameUniforms, pointer_strength)),
    ("u_scale", offset_of!(FrameUniforms, scale)),
    ("u_stops", offset_of!(FrameUniforms, color_stops)),
    ("u_weights", offset_of!(FrameUniforms, stop_weights)),
    ("u_drift", offset_of!(FrameUniforms, drift)),
    ("u_shading", offset_of!(FrameUniforms, shading)),
];

impl FrameUniforms {
    /// Block with the static field parameters filled in and the per-frame
    /// values zeroed.
    pub fn from_params(params: &FieldParams) -> Self {
        let mut color_stops = [[0.0; 4]; 4];
        for (slot, stop) in color_stops.iter_mut().zip(params.color_stops.iter()) {
            *slot = [stop[0], stop[1], stop[2], 1.0];
        }
        let weights = params.stop_weights;
        let drift = params.drift;
        Self {
            resolution: [0.0; 2],
            pointer: [0.0; 2],
            time: 0.0,
            pointer_falloff: params.pointer_falloff(),
            pointer_strength: params.pointer_strength,
            scale: params.scale,
            color_stops,
            stop_weights: [weights[0], weights[1], weights[2], 0.0],
            drift: [drift.speed, drift.sway, drift.frequency[0], drift.frequency[1]],
            shading: [
                params.shimmer,
                params.gradient_floor,
                params.shimmer_frequency,
                0.0,
            ],
        }
    }
}

/// Locations resolved once after linking, so per-frame binding is a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramBindings {
    pub position_location: u32,
    pub uniform_group: u32,
    pub uniform_binding: u32,
    pub time_offset: usize,
    pub resolution_offset: usize,
    pub pointer_offset: usize,
}

impl ProgramBindings {
    /// Matches the reflected stage interfaces against the host layout.
    pub fn resolve(
        vertex: &StageReflection,
        fragment: &StageReflection,
    ) -> Result<Self, RendererError> {
        let position_location = vertex
            .inputs
            .iter()
            .find(|(name, _)| name == "position")
            .map(|(_, location)| *location)
            .ok_or_else(|| link_error("vertex stage has no `position` input"))?;
        if position_location != POSITION_LOCATION {
            return Err(link_error(format!(
                "`position` is bound at location {position_location}, expected {POSITION_LOCATION}"
            )));
        }

        let block = fragment
            .uniform_block
            .as_ref()
            .ok_or_else(|| link_error("fragment stage declares no uniform block"))?;
        if (block.group, block.binding) != (UNIFORM_GROUP, UNIFORM_BINDING) {
            return Err(link_error(format!(
                "uniform block bound at set {} binding {}, expected set {UNIFORM_GROUP} binding {UNIFORM_BINDING}",
                block.group, block.binding
            )));
        }
        if block.size as usize != size_of::<FrameUniforms>() {
            return Err(link_error(format!(
                "uniform block is {} bytes, host block is {}",
                block.size,
                size_of::<FrameUniforms>()
            )));
        }

        let mut offsets = Vec::with_capacity(UNIFORM_LAYOUT.len());
        for (name, expected) in UNIFORM_LAYOUT {
            let reflected = block
                .members
                .iter()
                .find(|(member, _)| member == name)
                .map(|(_, offset)| *offset as usize)
                .ok_or_else(|| link_error(format!("uniform `{name}` is missing")))?;
            if reflected != expected {
                return Err(link_error(format!(
                    "uniform `{name}` at offset {reflected}, host expects {expected}"
                )));
            }
            offsets.push((name, reflected));
        }
        let lookup = |wanted: &str| {
            offsets
                .iter()
                .find(|(name, _)| *name == wanted)
                .map(|(_, offset)| *offset)
                .unwrap_or_default()
        };

        Ok(Self {
            position_location,
            uniform_group: block.group,
            uniform_binding: block.binding,
            time_offset: lookup("u_time"),
            resolution_offset: lookup("u_resolution"),
            pointer_offset: lookup("u_pointer"),
        })
    }
}

fn link_error(diagnostics: impl Into<String>) -> RendererError {
    RendererError::Link {
        diagnostics: diagnostics.into(),
    }
}

/// Values pushed to the program every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub elapsed_seconds: f32,
    /// Backing-store size in pixels.
    pub resolution: [f32; 2],
    /// Smoothed pointer, top-left origin, surface pixels.
    pub pointer_trail: [f32; 2],
}

/// Owns the host copy of the uniform block and uploads it each frame.
#[derive(Debug, Clone)]
pub struct UniformBinder {
    block: FrameUniforms,
    bindings: ProgramBindings,
}

impl UniformBinder {
    pub fn new(params: &FieldParams, bindings: ProgramBindings) -> Self {
        Self {
            block: FrameUniforms::from_params(params),
            bindings,
        }
    }

    pub fn block(&self) -> &FrameUniforms {
        &self.block
    }

    /// Writes time, resolution and pointer at their resolved offsets and
    /// uploads the block. The pointer is flipped into the shader's
    /// bottom-left space.
    pub fn bind_frame<D: GraphicsDevice>(
        &mut self,
        device: &mut D,
        program: &D::Program,
        frame: &FrameState,
    ) {
        let [width, height] = frame.resolution;
        let pointer = [frame.pointer_trail[0], height - frame.pointer_trail[1]];

        let bindings = self.bindings;
        let bytes = bytemuck::bytes_of_mut(&mut self.block);
        write_f32s(bytes, bindings.time_offset, &[frame.elapsed_seconds]);
        write_f32s(bytes, bindings.resolution_offset, &[width, height]);
        write_f32s(bytes, bindings.pointer_offset, &pointer);

        device.write_uniforms(program, &self.block);
    }
}

fn write_f32s(bytes: &mut [u8], offset: usize, values: &[f32]) {
    let source: &[u8] = bytemuck::cast_slice(values);
    bytes[offset..offset + source.len()].copy_from_slice(source);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compose_fragment, reflect_stage, VERTEX_SHADER_GLSL};
    use crate::device::StageKind;
    use crate::testing::{Call, RecordingDevice};

    fn default_bindings() -> ProgramBindings {
        let vertex = reflect_stage(StageKind::Vertex, VERTEX_SHADER_GLSL).unwrap();
        let fragment = reflect_stage(StageKind::Fragment, &compose_fragment(6)).unwrap();
        ProgramBindings::resolve(&vertex, &fragment).unwrap()
    }

    #[test]
    fn block_layout_matches_std140() {
        assert_eq!(size_of::<FrameUniforms>(), 144);
        let offsets: Vec<usize> = UNIFORM_LAYOUT.iter().map(|(_, offset)| *offset).collect();
        assert_eq!(offsets, vec![0, 8, 16, 20, 24, 28, 32, 96, 112, 128]);
    }

    #[test]
    fn from_params_fills_static_fields() {
        let params = FieldParams::default();
        let block = FrameUniforms::from_params(&params);
        assert_eq!(block.pointer_falloff, 3.0);
        assert_eq!(block.color_stops[2], [0.1, 0.3, 0.8, 1.0]);
        assert_eq!(block.stop_weights, [1.0, 0.7, 0.5, 0.0]);
        assert_eq!(block.time, 0.0);
    }

    #[test]
    fn resolves_locations_from_shipped_shaders() {
        let bindings = default_bindings();
        assert_eq!(bindings.position_location, POSITION_LOCATION);
        assert_eq!(bindings.time_offset, 16);
        assert_eq!(bindings.resolution_offset, 0);
        assert_eq!(bindings.pointer_offset, 8);
    }

    #[test]
    fn resolve_rejects_missing_position_input() {
        let vertex = reflect_stage(
            StageKind::Vertex,
            "#version 450\nlayout(location = 0) in vec2 corner;\nvoid main() { gl_Position = vec4(corner, 0.0, 1.0); }\n",
        )
        .unwrap();
        let fragment = reflect_stage(StageKind::Fragment, &compose_fragment(6)).unwrap();
        let err = ProgramBindings::resolve(&vertex, &fragment).unwrap_err();
        assert!(matches!(err, RendererError::Link { .. }));
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn bind_frame_flips_pointer_and_uploads() {
        let mut device = RecordingDevice::new();
        let program = device.fake_program();
        let mut binder = UniformBinder::new(&FieldParams::default(), default_bindings());

        binder.bind_frame(
            &mut device,
            &program,
            &FrameState {
                elapsed_seconds: 2.5,
                resolution: [800.0, 600.0],
                pointer_trail: [100.0, 150.0],
            },
        );

        let block = binder.block();
        assert_eq!(block.time, 2.5);
        assert_eq!(block.resolution, [800.0, 600.0]);
        assert_eq!(block.pointer, [100.0, 450.0]);
        assert_eq!(block.scale, 3.0);
        assert_eq!(device.calls(), vec![Call::WriteUniforms(program, 2.5)]);
    }
}
