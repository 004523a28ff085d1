use std::time::{Duration, Instant};

/// Refresh rate assumed when the monitor does not report one.
pub const FALLBACK_REFRESH_HZ: u32 = 60;

/// Spaces frames one display refresh apart.
///
/// The runtime marks each dispatched frame; the next frame is not due before
/// `last + interval`. A frame requested after a long idle period is due at once.
#[derive(Debug, Copy, Clone)]
pub struct FramePacer {
    interval: Duration,
    last: Option<Instant>,
}

impl FramePacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Pacer for a monitor reporting `millihertz` (winit's
    /// `MonitorHandle::refresh_rate_millihertz`). `None` or `0` falls back to 60 Hz.
    pub fn from_millihertz(millihertz: Option<u32>) -> Self {
        let interval = match millihertz {
            Some(mhz) if mhz > 0 => Duration::from_secs_f64(1_000.0 / mhz as f64),
            _ => Duration::from_secs(1) / FALLBACK_REFRESH_HZ,
        };
        Self::new(interval)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Earliest instant, not before `now`, at which the next frame may run.
    pub fn next_deadline(&self, now: Instant) -> Instant {
        match self.last {
            Some(last) => (last + self.interval).max(now),
            None => now,
        }
    }

    /// Records a frame dispatched at `at`.
    pub fn mark(&mut self, at: Instant) {
        self.last = Some(at);
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::from_millihertz(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── interval ──────────────────────────────────────────────────────────

    #[test]
    fn interval_from_reported_refresh_rate() {
        let pacer = FramePacer::from_millihertz(Some(120_000));
        let ms = pacer.interval().as_secs_f64() * 1_000.0;
        assert!((ms - 8.333).abs() < 0.001);
    }

    #[test]
    fn unknown_refresh_rate_falls_back_to_60hz() {
        let expected = Duration::from_secs(1) / 60;
        assert_eq!(FramePacer::from_millihertz(None).interval(), expected);
        assert_eq!(FramePacer::from_millihertz(Some(0)).interval(), expected);
        assert_eq!(FramePacer::default().interval(), expected);
    }

    // ── deadlines ─────────────────────────────────────────────────────────

    #[test]
    fn first_frame_is_due_immediately() {
        let pacer = FramePacer::new(Duration::from_millis(16));
        let now = Instant::now();
        assert_eq!(pacer.next_deadline(now), now);
    }

    #[test]
    fn next_frame_waits_one_interval() {
        let mut pacer = FramePacer::new(Duration::from_millis(16));
        let t0 = Instant::now();
        pacer.mark(t0);

        let soon = t0 + Duration::from_millis(2);
        assert_eq!(pacer.next_deadline(soon), t0 + Duration::from_millis(16));
    }

    #[test]
    fn late_request_is_due_now() {
        let mut pacer = FramePacer::new(Duration::from_millis(16));
        let t0 = Instant::now();
        pacer.mark(t0);

        let late = t0 + Duration::from_millis(500);
        assert_eq!(pacer.next_deadline(late), late);
    }
}
