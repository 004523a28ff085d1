use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cadence_engine::input::Region;
use cadence_engine::scheduler::{FrameScheduler, Registration};
use cadence_engine::time::DeltaClamp;

use crate::ease::ease_factor;

/// Scheduler id of the pointer-following callback.
pub const POINTER_ID: &str = "pointer-glow";

/// Eased pointer position published for renderers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Glow {
    pub x: f32,
    pub y: f32,
    /// Fades from 0 to 1 after the pointer enters the region.
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct PointerConfig {
    /// Only pointer positions inside this region are tracked.
    pub region: Region,
    /// Fraction of the remaining distance the glow covers per 60 Hz frame.
    pub follow: f32,
    pub fade_in_ms: f64,
    pub clamp: DeltaClamp,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            follow: 0.2,
            fade_in_ms: 150.0,
            clamp: DeltaClamp::default(),
        }
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    target: (f32, f32),
    pos: Option<(f32, f32)>,
    intensity: f32,
}

/// Cursor-following glow that only costs frame time while the pointer is inside
/// its region.
///
/// Entering the region registers the callback; leaving it (or the window)
/// unregisters it and clears the published glow.
pub struct PointerTracker {
    scheduler: FrameScheduler,
    config: PointerConfig,
    state: Rc<RefCell<TrackerState>>,
    glow: Rc<Cell<Option<Glow>>>,
    /// `Some` while tracking.
    registration: Option<Registration>,
}

impl PointerTracker {
    pub fn new(scheduler: &FrameScheduler, config: PointerConfig) -> Self {
        Self {
            scheduler: scheduler.clone(),
            config,
            state: Rc::new(RefCell::new(TrackerState::default())),
            glow: Rc::new(Cell::new(None)),
            registration: None,
        }
    }

    pub fn on_pointer_moved(&mut self, x: f32, y: f32) {
        if !self.config.region.contains(x, y) {
            self.stop();
            return;
        }

        self.state.borrow_mut().target = (x, y);
        if self.registration.is_none() {
            self.start();
        }
    }

    pub fn on_pointer_left(&mut self) {
        self.stop();
    }

    /// Replaces the tracked region, e.g. after a resize.
    pub fn set_region(&mut self, region: Region) {
        self.config.region = region;
        let (x, y) = self.state.borrow().target;
        if self.is_tracking() && !region.contains(x, y) {
            self.stop();
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.registration.is_some()
    }

    /// Shared cell holding the current glow, `None` while not tracking.
    pub fn glow_cell(&self) -> Rc<Cell<Option<Glow>>> {
        Rc::clone(&self.glow)
    }

    fn start(&mut self) {
        let state = Rc::clone(&self.state);
        let glow = Rc::clone(&self.glow);
        let follow = self.config.follow;
        let fade_in_ms = self.config.fade_in_ms;
        let clamp = self.config.clamp;

        let registration = self.scheduler.register(POINTER_ID, move |_, delta_ms| {
            let delta_ms = clamp.apply(delta_ms);
            let mut state = state.borrow_mut();

            let (tx, ty) = state.target;
            let (x, y) = match state.pos {
                None => (tx, ty),
                Some((x, y)) => {
                    let k = ease_factor(follow, delta_ms);
                    (x + (tx - x) * k, y + (ty - y) * k)
                }
            };
            state.pos = Some((x, y));

            let step = if fade_in_ms > 0.0 { (delta_ms / fade_in_ms) as f32 } else { 1.0 };
            state.intensity = (state.intensity + step).min(1.0);

            glow.set(Some(Glow { x, y, intensity: state.intensity }));
            Ok(())
        });
        self.registration = Some(registration);
        log::debug!("pointer tracking started");
    }

    fn stop(&mut self) {
        let Some(registration) = self.registration.take() else {
            return;
        };
        self.scheduler.revoke(&registration);

        let mut state = self.state.borrow_mut();
        state.pos = None;
        state.intensity = 0.0;
        self.glow.set(None);
        log::debug!("pointer tracking stopped");
    }
}

impl Drop for PointerTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
