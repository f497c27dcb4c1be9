use winit::dpi::PhysicalSize;

/// Smoothing rate used when none is configured.
pub const DEFAULT_TRAIL_RATE: f32 = 0.08;

/// Moves `trail` a fraction `rate` of the way towards `raw`.
pub fn advance_trail(trail: [f32; 2], raw: [f32; 2], rate: f32) -> [f32; 2] {
    [
        trail[0] + (raw[0] - trail[0]) * rate,
        trail[1] + (raw[1] - trail[1]) * rate,
    ]
}

/// Raw and smoothed pointer positions in surface pixels, top-left origin.
///
/// `raw` is written by input events, `trail` only by the render loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerTracker {
    raw: [f32; 2],
    trail: [f32; 2],
    rate: f32,
    listening: bool,
}

impl PointerTracker {
    /// `rate` must lie in `(0, 1]`; configuration rejects anything else
    /// before it gets here. Debug builds assert it, release builds clamp.
    pub fn new(rate: f32) -> Self {
        debug_assert!(
            rate > 0.0 && rate <= 1.0,
            "trail rate must be within (0, 1], got {rate}"
        );
        Self {
            raw: [0.0, 0.0],
            trail: [0.0, 0.0],
            rate: rate.clamp(f32::EPSILON, 1.0),
            listening: false,
        }
    }

    pub fn register_listener(&mut self) {
        self.listening = true;
    }

    pub fn remove_listener(&mut self) {
        self.listening = false;
    }

    /// Records a pointer event, clamped to `bounds`. Ignored once the
    /// listener has been removed.
    pub fn on_pointer_move(&mut self, x: f64, y: f64, bounds: PhysicalSize<u32>) {
        if !self.listening {
            return;
        }
        let max_x = bounds.width as f64;
        let max_y = bounds.height as f64;
        self.raw = [x.clamp(0.0, max_x) as f32, y.clamp(0.0, max_y) as f32];
    }

    /// Advances the trail by one frame and returns the new value.
    pub fn advance(&mut self) -> [f32; 2] {
        self.trail = advance_trail(self.trail, self.raw, self.rate);
        self.trail
    }

    pub fn raw(&self) -> [f32; 2] {
        self.raw
    }

    pub fn trail(&self) -> [f32; 2] {
        self.trail
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_RATE)
    }
}
