use std::fmt;

use cadence_engine::scheduler::FrameScheduler;

/// Scheduler health at one poll.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OverlayReport {
    pub callbacks: usize,
    pub active: bool,
    /// Frames dispatched per second since the previous poll.
    pub fps: f64,
}

impl fmt::Display for OverlayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.active { "running" } else { "idle" };
        write!(
            f,
            "frame loop: {state} | callbacks: {} | {:.1} fps",
            self.callbacks, self.fps
        )
    }
}

/// Development-only view of the scheduler, polled on a coarse interval.
///
/// Purely informational: it reads the scheduler's counters and never registers a
/// callback, so it does not keep the loop alive.
pub struct DebugOverlay {
    scheduler: FrameScheduler,
    last: Option<(f64, u64)>,
}

impl DebugOverlay {
    pub fn new(scheduler: &FrameScheduler) -> Self {
        Self {
            scheduler: scheduler.clone(),
            last: None,
        }
    }

    /// Samples the scheduler at `now_ms`.
    pub fn poll(&mut self, now_ms: f64) -> OverlayReport {
        let frames = self.scheduler.frames_dispatched();

        let fps = match self.last {
            Some((then, before)) if now_ms > then => {
                frames.wrapping_sub(before) as f64 * 1_000.0 / (now_ms - then)
            }
            _ => 0.0,
        };
        self.last = Some((now_ms, frames));

        let report = OverlayReport {
            callbacks: self.scheduler.callback_count(),
            active: self.scheduler.is_active(),
            fps,
        };
        log::debug!("{report}");
        report
    }
}
