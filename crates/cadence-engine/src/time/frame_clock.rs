use std::time::Instant;

/// Monotonic millisecond clock.
///
/// Timestamps are `f64` milliseconds since the clock's origin, matching the unit the
/// frame scheduler hands to its callbacks.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    /// Milliseconds elapsed since the origin.
    pub fn now_ms(&self) -> f64 {
        Instant::now()
            .saturating_duration_since(self.origin)
            .as_secs_f64()
            * 1_000.0
    }

    /// Re-anchors the origin at the current instant.
    pub fn reset(&mut self) {
        self.origin = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Delta-time clamp applied by consumers.
///
/// The scheduler reports raw deltas. Simulations clamp them so that a stall
/// (debugger pause, minimized window) does not blow up the next step, and a
/// zero delta from a tight loop still makes progress.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DeltaClamp {
    pub min_ms: f64,
    pub max_ms: f64,
}

impl DeltaClamp {
    pub fn new(min_ms: f64, max_ms: f64) -> Self {
        debug_assert!(min_ms <= max_ms);
        Self { min_ms, max_ms }
    }

    /// Clamps `delta_ms` into `[min_ms, max_ms]`. NaN maps to `min_ms`.
    pub fn apply(&self, delta_ms: f64) -> f64 {
        if delta_ms.is_nan() {
            return self.min_ms;
        }
        delta_ms.clamp(self.min_ms, self.max_ms)
    }
}

impl Default for DeltaClamp {
    fn default() -> Self {
        Self {
            min_ms: 0.1,
            max_ms: 250.0,
        }
    }
}
