use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cadence_engine::scheduler::{FrameScheduler, Registration};
use cadence_engine::time::DeltaClamp;

use crate::ease::ease_factor;

/// Scheduler id of the smooth-scroll callback.
pub const SCROLL_ID: &str = "scroll-physics";

/// Smooth-scroll tuning.
#[derive(Debug, Clone)]
pub struct ScrollConfig {
    /// Fraction of the remaining distance covered per 60 Hz frame.
    pub lerp: f32,
    /// Scale applied to wheel deltas.
    pub wheel_multiplier: f32,
    /// Distance under which the offset snaps to the target.
    pub snap_px: f32,
    pub clamp: DeltaClamp,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            lerp: 0.1,
            wheel_multiplier: 1.0,
            snap_px: 0.5,
            clamp: DeltaClamp::default(),
        }
    }
}

#[derive(Debug, Default)]
struct ScrollState {
    target: f32,
    current: f32,
    max_offset: f32,
}

impl ScrollState {
    fn step(&mut self, delta_ms: f64, config: &ScrollConfig) {
        let remaining = self.target - self.current;
        if remaining == 0.0 {
            return;
        }

        self.current += remaining * ease_factor(config.lerp, delta_ms);
        if (self.target - self.current).abs() < config.snap_px {
            self.current = self.target;
        }
    }

    fn set_target(&mut self, target: f32) {
        self.target = target.clamp(0.0, self.max_offset);
    }
}

/// Eased scroll offset driven by wheel input.
///
/// Wheel events move a target; every frame the published offset eases toward it by a
/// frame-rate-independent fraction of the remaining distance. Registered for its
/// whole lifetime, unregistered on drop.
pub struct ScrollPhysics {
    scheduler: FrameScheduler,
    registration: Registration,
    config: ScrollConfig,
    state: Rc<RefCell<ScrollState>>,
    offset: Rc<Cell<f32>>,
}

impl ScrollPhysics {
    /// Registers the scroll callback on `scheduler`. The offset ranges over `[0, max_offset]`.
    pub fn mount(scheduler: &FrameScheduler, config: ScrollConfig, max_offset: f32) -> Self {
        let state = Rc::new(RefCell::new(ScrollState {
            max_offset: max_offset.max(0.0),
            ..ScrollState::default()
        }));
        let offset = Rc::new(Cell::new(0.0));

        let registration = {
            let state = Rc::clone(&state);
            let offset = Rc::clone(&offset);
            let config = config.clone();
            scheduler.register(SCROLL_ID, move |_, delta_ms| {
                let mut state = state.borrow_mut();
                state.step(config.clamp.apply(delta_ms), &config);
                offset.set(state.current);
                Ok(())
            })
        };

        Self {
            scheduler: scheduler.clone(),
            registration,
            config,
            state,
            offset,
        }
    }

    pub fn on_wheel(&self, dy: f32) {
        let mut state = self.state.borrow_mut();
        let target = state.target + dy * self.config.wheel_multiplier;
        state.set_target(target);
    }

    /// Moves the target to `y`. With `immediate`, the offset jumps there too.
    pub fn scroll_to(&self, y: f32, immediate: bool) {
        let mut state = self.state.borrow_mut();
        state.set_target(y);
        if immediate {
            state.current = state.target;
            self.offset.set(state.current);
        }
    }

    /// Changes the scroll range, pulling the target and offset back inside it.
    pub fn set_max_offset(&self, max_offset: f32) {
        let mut state = self.state.borrow_mut();
        state.max_offset = max_offset.max(0.0);
        let target = state.target;
        state.set_target(target);
        state.current = state.current.min(state.max_offset);
        self.offset.set(state.current);
    }

    /// Offset published on the last frame.
    pub fn offset(&self) -> f32 {
        self.offset.get()
    }

    pub fn target(&self) -> f32 {
        self.state.borrow().target
    }

    pub fn is_settled(&self) -> bool {
        let state = self.state.borrow();
        state.current == state.target
    }

    /// Shared cell holding the offset, for effects that follow the scroll.
    pub fn offset_cell(&self) -> Rc<Cell<f32>> {
        Rc::clone(&self.offset)
    }
}

impl Drop for ScrollPhysics {
    fn drop(&mut self) {
        // A newer mount may own the id by now.
        self.scheduler.revoke(&self.registration);
    }
}

#[cfg(test)]
mod tests {
    use cadence_engine::scheduler::ManualFrameSource;

    use super::*;
    use crate::ease::REFERENCE_FRAME_MS;

    fn setup(max: f32) -> (ManualFrameSource, FrameScheduler, ScrollPhysics) {
        let source = ManualFrameSource::new();
        let scheduler = FrameScheduler::new(source.clone());
        let scroll = ScrollPhysics::mount(&scheduler, ScrollConfig::default(), max);
        (source, scheduler, scroll)
    }

    fn frames(source: &ManualFrameSource, scheduler: &FrameScheduler, n: usize, delta_ms: f64) {
        for _ in 0..n {
            source.advance(delta_ms);
            source.fire(scheduler);
        }
    }

    #[test]
    fn mount_registers_and_drop_unregisters() {
        let (_source, scheduler, scroll) = setup(1_000.0);
        assert_eq!(scheduler.callback_count(), 1);
        assert!(scheduler.is_active());

        drop(scroll);
        assert_eq!(scheduler.callback_count(), 0);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn dropping_replaced_instance_keeps_remount_running() {
        let (source, scheduler, old) = setup(1_000.0);
        let live = ScrollPhysics::mount(&scheduler, ScrollConfig::default(), 1_000.0);
        drop(old);

        assert_eq!(scheduler.callback_count(), 1);
        assert!(scheduler.is_active());

        live.on_wheel(100.0);
        frames(&source, &scheduler, 1, REFERENCE_FRAME_MS);
        assert!(live.offset() > 0.0);

        drop(live);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn wheel_target_is_clamped_to_range() {
        let (_source, _scheduler, scroll) = setup(500.0);
        scroll.on_wheel(-50.0);
        assert_eq!(scroll.target(), 0.0);
        scroll.on_wheel(10_000.0);
        assert_eq!(scroll.target(), 500.0);
    }

    #[test]
    fn first_frame_covers_lerp_fraction() {
        let (source, scheduler, scroll) = setup(1_000.0);
        scroll.on_wheel(100.0);
        frames(&source, &scheduler, 1, REFERENCE_FRAME_MS);
        assert!((scroll.offset() - 10.0).abs() < 0.01);
    }

    #[test]
    fn offset_converges_and_snaps() {
        let (source, scheduler, scroll) = setup(1_000.0);
        scroll.on_wheel(100.0);

        let mut last = 0.0;
        for _ in 0..120 {
            frames(&source, &scheduler, 1, REFERENCE_FRAME_MS);
            assert!(scroll.offset() >= last);
            last = scroll.offset();
        }
        assert_eq!(scroll.offset(), 100.0);
        assert!(scroll.is_settled());
    }

    #[test]
    fn easing_is_frame_rate_independent() {
        let (fast_src, fast_sched, fast) = setup(1_000.0);
        let (slow_src, slow_sched, slow) = setup(1_000.0);
        fast.on_wheel(300.0);
        slow.on_wheel(300.0);

        frames(&fast_src, &fast_sched, 20, REFERENCE_FRAME_MS / 2.0);
        frames(&slow_src, &slow_sched, 10, REFERENCE_FRAME_MS);

        assert!((fast.offset() - slow.offset()).abs() < 0.01);
    }

    #[test]
    fn long_stall_is_clamped() {
        let (source, scheduler, scroll) = setup(1_000.0);
        scroll.on_wheel(1_000.0);
        // A 10s stall eases as if 250ms had passed.
        frames(&source, &scheduler, 1, 10_000.0);
        assert!(scroll.offset() < 1_000.0);
        assert!(scroll.offset() > 700.0);
    }

    #[test]
    fn immediate_scroll_and_shrinking_range() {
        let (_source, _scheduler, scroll) = setup(1_000.0);
        scroll.scroll_to(800.0, true);
        assert_eq!(scroll.offset(), 800.0);

        scroll.set_max_offset(300.0);
        assert_eq!(scroll.target(), 300.0);
        assert_eq!(scroll.offset(), 300.0);
    }
}
