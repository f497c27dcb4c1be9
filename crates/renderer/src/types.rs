/// Linear RGB triple with channels in `[0, 1]`.
pub type Rgb = [f32; 3];

/// Upper bound on FBM octaves; beyond this the finest octave is sub-pixel.
pub const MAX_OCTAVES: u32 = 8;

/// Number of color stops blended by the fragment stage.
pub const COLOR_STOP_COUNT: usize = 4;

/// Default stops: dark base, deep purple, blue, pink.
pub const DEFAULT_COLOR_STOPS: [Rgb; COLOR_STOP_COUNT] = [
    [0.1, 0.1, 0.2],
    [0.2, 0.1, 0.4],
    [0.1, 0.3, 0.8],
    [0.8, 0.2, 0.5],
];

/// Slow background motion applied to the noise domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftParams {
    /// Linear drift along both axes, in noise units per second.
    pub speed: f32,
    /// Amplitude of the sinusoidal sway added on top of the linear drift.
    pub sway: f32,
    /// Angular frequency of the sway on the x and y axes.
    pub frequency: [f32; 2],
}

impl Default for DriftParams {
    fn default() -> Self {
        Self {
            speed: 0.1,
            sway: 0.35,
            frequency: [0.11, 0.07],
        }
    }
}

/// Tunable constants of the noise field and its color composition.
///
/// The blend weights and shading constants were tuned by eye; treat them as
/// defaults rather than invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParams {
    /// FBM octave count, clamped to `1..=MAX_OCTAVES` when the shader is composed.
    pub octaves: u32,
    /// Multiplier from aspect-corrected UV space into noise space.
    pub scale: f32,
    /// Base color followed by the three blended stops.
    pub color_stops: [Rgb; COLOR_STOP_COUNT],
    /// Blend weight of stops 1..3 relative to the FBM value.
    pub stop_weights: [f32; 3],
    /// Amplitude of the low-frequency brightness oscillation.
    pub shimmer: f32,
    /// Spatial frequency of the brightness oscillation.
    pub shimmer_frequency: f32,
    /// Brightness multiplier at the bottom edge; the top edge is always 1.0.
    pub gradient_floor: f32,
    pub drift: DriftParams,
    /// Radius (in UV units) over which the pointer push decays by `e^-3`.
    pub pointer_radius: f32,
    /// Scale of the pointer push; `0.0` yields the static background.
    pub pointer_strength: f32,
    /// Per-frame interpolation rate of the pointer trail, in `(0, 1)`.
    pub trail_rate: f32,
}

impl FieldParams {
    pub fn clamped_octaves(&self) -> u32 {
        self.octaves.clamp(1, MAX_OCTAVES)
    }

    /// Exponential decay constant of the pointer push.
    pub fn pointer_falloff(&self) -> f32 {
        3.0 / self.pointer_radius.max(f32::EPSILON)
    }
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            octaves: 6,
            scale: 3.0,
            color_stops: DEFAULT_COLOR_STOPS,
            stop_weights: [1.0, 0.7, 0.5],
            shimmer: 0.1,
            shimmer_frequency: 10.0,
            gradient_floor: 0.8,
            drift: DriftParams::default(),
            pointer_radius: 1.0,
            pointer_strength: 1.0,
            trail_rate: 0.08,
        }
    }
}

/// GPU adapter selection preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    /// Prefer integrated GPUs; a background should not spin up the dGPU.
    #[default]
    Low,
    High,
}

impl std::fmt::Display for GpuPowerPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuPowerPreference::Low => f.write_str("low"),
            GpuPowerPreference::High => f.write_str("high"),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Window title shown by the compositor.
    pub title: String,
    /// Noise field parameters.
    pub params: FieldParams,
    /// Optional FPS cap; `None` renders once per display refresh.
    pub target_fps: Option<f32>,
    /// Adapter power preference.
    pub power: GpuPowerPreference,
    /// When false, prefer a non-blocking present mode.
    pub vsync: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "driftfield".to_string(),
            params: FieldParams::default(),
            target_fps: None,
            power: GpuPowerPreference::default(),
            vsync: true,
        }
    }
}
