//! GLSL sources for the noise field and the reflection pass that reads their
//! interfaces back out of naga.

use wgpu::naga;

use crate::device::StageKind;
use crate::error::RendererError;
use crate::types::MAX_OCTAVES;

/// Pass-through vertex stage for the full-screen quad.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";

/// Uniform block shared with [`crate::uniforms::FrameUniforms`]; member order
/// and std140 offsets must match the host struct.
const FRAGMENT_UNIFORMS: &str = r"layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform FieldUniforms {
    vec2 u_resolution;
    vec2 u_pointer;
    float u_time;
    float u_pointer_falloff;
    float u_pointer_strength;
    float u_scale;
    vec4 u_stops[4];
    vec4 u_weights;
    vec4 u_drift;
    vec4 u_shading;
} field;
";

const FRAGMENT_BODY: &str = r"float hash(vec2 p) {
    return fract(sin(dot(p, vec2(127.1, 311.7))) * sin(dot(p, vec2(269.5, 183.3))) * 43758.5453);
}

float noise(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);
    vec2 u = f * f * f * (f * (f * 6.0 - 15.0) + 10.0);

    float a = hash(i);
    float b = hash(i + vec2(1.0, 0.0));
    float c = hash(i + vec2(0.0, 1.0));
    float d = hash(i + vec2(1.0, 1.0));

    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}

float fbm(vec2 p, vec2 offset) {
    float value = 0.0;
    float amplitude = 0.5;
    float frequency = 1.0;
    vec2 base = p + offset;
    for (int octave = 0; octave < FBM_OCTAVES; octave++) {
        value += noise(base * frequency) * amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    return value;
}

vec2 aspect_uv(vec2 pixel) {
    vec2 res = max(field.u_resolution, vec2(1.0));
    return vec2(pixel.x / res.x * (res.x / res.y), pixel.y / res.y);
}

vec2 base_drift(float t) {
    vec4 drift = field.u_drift;
    return vec2(
        t * drift.x + drift.y * sin(t * drift.z),
        t * drift.x + drift.y * cos(t * drift.w)
    );
}

vec2 pointer_influence(vec2 uv, vec2 pointer_uv) {
    vec2 delta = uv - pointer_uv;
    return delta * exp(-field.u_pointer_falloff * length(delta)) * field.u_pointer_strength;
}

void main() {
    // wgpu's fragment origin is top-left; the field is laid out bottom-left.
    vec2 frag = vec2(gl_FragCoord.x, field.u_resolution.y - gl_FragCoord.y);
    vec2 uv = aspect_uv(frag);
    float t = field.u_time;

    vec2 offset = base_drift(t) + pointer_influence(uv, aspect_uv(field.u_pointer));
    float f = fbm(uv * field.u_scale, offset);

    vec3 color = mix(field.u_stops[0].rgb, field.u_stops[1].rgb, f * field.u_weights.x);
    color = mix(color, field.u_stops[2].rgb, f * field.u_weights.y);
    color = mix(color, field.u_stops[3].rgb, f * field.u_weights.z);

    float frequency = field.u_shading.z;
    float shimmer = field.u_shading.x * sin(t + uv.x * frequency) * cos(t + uv.y * frequency);
    float lift = field.u_shading.y;
    color = (color + shimmer) * (lift + (1.0 - lift) * uv.y);

    outColor = vec4(color, 1.0);
}
";

/// Builds the fragment stage with the octave count baked in.
pub fn compose_fragment(octaves: u32) -> String {
    let octaves = octaves.clamp(1, MAX_OCTAVES);
    format!("#version 450\n#define FBM_OCTAVES {octaves}\n\n{FRAGMENT_UNIFORMS}\n{FRAGMENT_BODY}")
}

/// Interface of one compiled stage as seen by naga.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReflection {
    /// Entry-point inputs with explicit locations.
    pub inputs: Vec<(String, u32)>,
    pub uniform_block: Option<UniformBlockReflection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockReflection {
    pub group: u32,
    pub binding: u32,
    /// Size of the block in bytes.
    pub size: u32,
    /// Member names and byte offsets, in declaration order.
    pub members: Vec<(String, u32)>,
}

/// Parses `source` with naga's GLSL frontend and extracts its inputs and
/// uniform block. Parse failures are reported as compile errors carrying the
/// frontend's diagnostics.
pub fn reflect_stage(kind: StageKind, source: &str) -> Result<StageReflection, RendererError> {
    let options = naga::front::glsl::Options::from(kind.naga_stage());
    let module = naga::front::glsl::Frontend::default()
        .parse(&options, source)
        .map_err(|errors| RendererError::Compile {
            stage: kind,
            diagnostics: errors.emit_to_string(source),
        })?;

    let mut reflection = StageReflection::default();

    for entry in &module.entry_points {
        for argument in &entry.function.arguments {
            if let (Some(name), Some(naga::Binding::Location { location, .. })) =
                (&argument.name, &argument.binding)
            {
                reflection.inputs.push((name.clone(), *location));
            }
        }
    }

    for (_, global) in module.global_variables.iter() {
        if global.space != naga::AddressSpace::Uniform {
            continue;
        }
        let Some(binding) = &global.binding else {
            continue;
        };
        if let naga::TypeInner::Struct { members, span } = &module.types[global.ty].inner {
            reflection.uniform_block = Some(UniformBlockReflection {
                group: binding.group,
                binding: binding.binding,
                size: *span,
                members: members
                    .iter()
                    .map(|member| (member.name.clone().unwrap_or_default(), member.offset))
                    .collect(),
            });
            break;
        }
    }

    Ok(reflection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_bakes_clamped_octaves() {
        assert!(compose_fragment(6).contains("#define FBM_OCTAVES 6\n"));
        assert!(compose_fragment(0).contains("#define FBM_OCTAVES 1\n"));
        assert!(compose_fragment(40).contains("#define FBM_OCTAVES 8\n"));
        assert!(compose_fragment(3).starts_with("#version 450\n"));
    }

    #[test]
    fn vertex_stage_exposes_position() {
        let reflection = reflect_stage(StageKind::Vertex, VERTEX_SHADER_GLSL).unwrap();
        assert_eq!(reflection.inputs, vec![("position".to_string(), 0)]);
        assert!(reflection.uniform_block.is_none());
    }

    #[test]
    fn fragment_stage_block_uses_std140_offsets() {
        let reflection = reflect_stage(StageKind::Fragment, &compose_fragment(6)).unwrap();
        let block = reflection.uniform_block.expect("uniform block");
        assert_eq!((block.group, block.binding), (0, 0));
        assert_eq!(block.size, 144);
        let offsets: Vec<(&str, u32)> = block
            .members
            .iter()
            .map(|(name, offset)| (name.as_str(), *offset))
            .collect();
        assert_eq!(
            offsets,
            vec![
                ("u_resolution", 0),
                ("u_pointer", 8),
                ("u_time", 16),
                ("u_pointer_falloff", 20),
                ("u_pointer_strength", 24),
                ("u_scale", 28),
                ("u_stops", 32),
                ("u_weights", 96),
                ("u_drift", 112),
                ("u_shading", 128),
            ]
        );
    }

    #[test]
    fn broken_source_reports_compile_diagnostics() {
        let err = reflect_stage(
            StageKind::Fragment,
            "#version 450\nvoid main() { undefined_call(); }\n",
        )
        .unwrap_err();
        match err {
            RendererError::Compile { stage, diagnostics } => {
                assert_eq!(stage, StageKind::Fragment);
                assert!(!diagnostics.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
