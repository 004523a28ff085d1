/// Frame duration the lerp factors are tuned against (60 Hz).
pub(crate) const REFERENCE_FRAME_MS: f64 = 1_000.0 / 60.0;

/// Converts a per-reference-frame lerp factor into the factor for `delta_ms`.
///
/// Two half-length frames ease exactly as far as one full-length frame.
pub(crate) fn ease_factor(lerp: f32, delta_ms: f64) -> f32 {
    let lerp = lerp.clamp(0.0, 1.0);
    let frames = (delta_ms / REFERENCE_FRAME_MS) as f32;
    1.0 - (1.0 - lerp).powf(frames)
}
