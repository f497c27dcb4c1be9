//! CPU reference of the fragment-stage noise field.
//!
//! Every function here mirrors the GLSL in [`crate::compile`] operation for
//! operation, in `f32`, so still frames and tests see the same field the GPU
//! draws (up to driver differences in `sin`).

use crate::types::{FieldParams, Rgb};

const HASH_A: [f32; 2] = [127.1, 311.7];
const HASH_B: [f32; 2] = [269.5, 183.3];
const HASH_SCALE: f32 = 43758.5453;

/// Deterministic pseudo-random value in `[0, 1)` for a 2D coordinate.
pub fn hash(p: [f32; 2]) -> f32 {
    let a = dot(p, HASH_A).sin();
    let b = dot(p, HASH_B).sin();
    fract(a * b * HASH_SCALE)
}

/// Quintic smoothstep `t³(t(6t − 15) + 10)`.
pub fn quintic(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Value noise in `[0, 1)` with quintic interpolation between lattice corners.
pub fn noise(p: [f32; 2]) -> f32 {
    let i = [p[0].floor(), p[1].floor()];
    let f = [fract(p[0]), fract(p[1])];
    let u = [quintic(f[0]), quintic(f[1])];

    let a = hash(i);
    let b = hash([i[0] + 1.0, i[1]]);
    let c = hash([i[0], i[1] + 1.0]);
    let d = hash([i[0] + 1.0, i[1] + 1.0]);

    mix(mix(a, b, u[0]), mix(c, d, u[0]), u[1])
}

/// Fractal Brownian motion over `octaves` octaves of [`noise`].
pub fn fbm(p: [f32; 2], offset: [f32; 2], octaves: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    let base = [p[0] + offset[0], p[1] + offset[1]];
    for _ in 0..octaves {
        value += noise([base[0] * frequency, base[1] * frequency]) * amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    value
}

/// The field evaluated with a fixed parameter set.
#[derive(Debug, Clone)]
pub struct NoiseField {
    params: FieldParams,
    octaves: u32,
    falloff: f32,
}

impl NoiseField {
    pub fn new(params: FieldParams) -> Self {
        let octaves = params.clamped_octaves();
        let falloff = params.pointer_falloff();
        Self {
            params,
            octaves,
            falloff,
        }
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    pub fn fbm(&self, p: [f32; 2], offset: [f32; 2]) -> f32 {
        fbm(p, offset, self.octaves)
    }

    /// Time-driven part of the domain warp.
    pub fn base_drift(&self, time: f32) -> [f32; 2] {
        let drift = &self.params.drift;
        [
            time * drift.speed + drift.sway * (time * drift.frequency[0]).sin(),
            time * drift.speed + drift.sway * (time * drift.frequency[1]).cos(),
        ]
    }

    /// Exponentially decaying push away from the pointer, in UV units.
    pub fn pointer_influence(&self, uv: [f32; 2], pointer_uv: [f32; 2]) -> [f32; 2] {
        let delta = [uv[0] - pointer_uv[0], uv[1] - pointer_uv[1]];
        let distance = (delta[0] * delta[0] + delta[1] * delta[1]).sqrt();
        let weight = (-self.falloff * distance).exp() * self.params.pointer_strength;
        [delta[0] * weight, delta[1] * weight]
    }

    /// Blends the color stops for an FBM value and applies the brightness
    /// oscillation and vertical gradient at `uv`.
    pub fn compose(&self, value: f32, uv: [f32; 2], time: f32) -> Rgb {
        let stops = &self.params.color_stops;
        let weights = &self.params.stop_weights;
        let mut color = mix3(stops[0], stops[1], value * weights[0]);
        color = mix3(color, stops[2], value * weights[1]);
        color = mix3(color, stops[3], value * weights[2]);

        let frequency = self.params.shimmer_frequency;
        let shimmer = self.params.shimmer
            * (time + uv[0] * frequency).sin()
            * (time + uv[1] * frequency).cos();
        let floor = self.params.gradient_floor;
        let gradient = floor + (1.0 - floor) * uv[1];
        color.map(|channel| (channel + shimmer) * gradient)
    }

    /// Color of the fragment at `frag` (pixel center, bottom-left origin).
    ///
    /// `pointer` is in the same pixel space; `None` disables the pointer push.
    pub fn shade(
        &self,
        frag: [f32; 2],
        resolution: [f32; 2],
        pointer: Option<[f32; 2]>,
        time: f32,
    ) -> Rgb {
        let uv = aspect_uv(frag, resolution);
        let mut offset = self.base_drift(time);
        if let Some(pointer) = pointer {
            let push = self.pointer_influence(uv, aspect_uv(pointer, resolution));
            offset = [offset[0] + push[0], offset[1] + push[1]];
        }
        let scale = self.params.scale;
        let value = self.fbm([uv[0] * scale, uv[1] * scale], offset);
        self.compose(value, uv, time)
    }
}

/// Normalises a pixel coordinate by the resolution and stretches `x` by the
/// aspect ratio so noise cells stay square.
pub fn aspect_uv(pixel: [f32; 2], resolution: [f32; 2]) -> [f32; 2] {
    let width = resolution[0].max(1.0);
    let height = resolution[1].max(1.0);
    [pixel[0] / width * (width / height), pixel[1] / height]
}

fn dot(a: [f32; 2], b: [f32; 2]) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}

// GLSL `fract`; rounding of `x - floor(x)` can produce exactly 1.0 for tiny
// negative inputs, which the shader range contract excludes.
fn fract(x: f32) -> f32 {
    let f = x - x.floor();
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn mix3(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [mix(a[0], b[0], t), mix(a[1], b[1], t), mix(a[2], b[2], t)]
}
