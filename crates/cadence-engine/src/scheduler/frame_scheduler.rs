use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::rc::{Rc, Weak};

use anyhow::Result;

use super::error::CallbackError;
use super::source::{FrameHandle, FrameSource};

/// Per-frame consumer callback, called with `(timestamp_ms, delta_ms)`.
///
/// Returning `Err` reports a failure for this frame only; the callback stays
/// registered and is called again on the next frame.
pub type FrameCallback = Box<dyn FnMut(f64, f64) -> Result<()>>;

type Slot = Rc<RefCell<FrameCallback>>;

thread_local! {
    static CALLBACK_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// `true` while a frame callback is executing on this thread.
///
/// Panic hooks use this to tell callback panics, which the scheduler catches and
/// logs itself, from panics that will unwind out of the program.
pub fn in_callback() -> bool {
    CALLBACK_DEPTH.with(|depth| depth.get() > 0)
}

struct CallbackGuard;

impl CallbackGuard {
    fn enter() -> Self {
        CALLBACK_DEPTH.with(|depth| depth.set(depth.get() + 1));
        CallbackGuard
    }
}

impl Drop for CallbackGuard {
    fn drop(&mut self) {
        CALLBACK_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Receipt for one [`FrameScheduler::register`] call.
///
/// Registering again under the same id supersedes the receipt; revoking a
/// superseded receipt leaves the newer callback in place.
#[derive(Clone)]
pub struct Registration {
    id: String,
    slot: Weak<RefCell<FrameCallback>>,
}

impl Registration {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn owns(&self, slot: &Slot) -> bool {
        ptr::eq(Rc::as_ptr(slot), self.slot.as_ptr())
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

struct State {
    callbacks: HashMap<String, Slot>,
    running: bool,
    /// Only meaningful while `running`.
    last_timestamp: f64,
    frame_handle: Option<FrameHandle>,
    frames_dispatched: u64,
    source: Box<dyn FrameSource>,
}

impl State {
    fn start(&mut self) {
        self.running = true;
        self.last_timestamp = self.source.now();
        if self.frame_handle.is_none() {
            self.frame_handle = Some(self.source.request_frame());
        }
        log::debug!("frame loop started at {:.1}ms", self.last_timestamp);
    }

    fn stop(&mut self) {
        self.running = false;
        if let Some(handle) = self.frame_handle.take() {
            self.source.cancel_frame(handle);
        }
        log::debug!("frame loop stopped");
    }
}

/// Multiplexes any number of named per-frame callbacks onto one platform frame loop.
///
/// `FrameScheduler` is a cheap handle: clones share the same registration table.
/// It is single-threaded (`!Send`); all registration and dispatch happen on the
/// thread that owns the platform loop.
///
/// Callbacks may register or unregister (themselves or others) while being
/// dispatched. The table is never borrowed across a callback invocation.
#[derive(Clone)]
pub struct FrameScheduler {
    state: Rc<RefCell<State>>,
}

impl FrameScheduler {
    /// Creates an idle scheduler with an empty registration table.
    pub fn new(source: impl FrameSource + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                callbacks: HashMap::new(),
                running: false,
                last_timestamp: 0.0,
                frame_handle: None,
                frames_dispatched: 0,
                source: Box::new(source),
            })),
        }
    }

    /// Registers `callback` under `id`, replacing any callback already registered
    /// under the same id.
    ///
    /// Registering the first callback starts the loop and resets the time baseline
    /// to "now", so the first delta covers only the time since registration.
    ///
    /// The returned [`Registration`] can be handed to [`revoke`](Self::revoke) by
    /// owners that must not remove a callback someone else registered later.
    pub fn register<F>(&self, id: impl Into<String>, callback: F) -> Registration
    where
        F: FnMut(f64, f64) -> Result<()> + 'static,
    {
        let id = id.into();
        if id.is_empty() {
            log::warn!("frame callback registered with an empty id");
        }

        let callback: FrameCallback = Box::new(callback);
        let slot: Slot = Rc::new(RefCell::new(callback));
        let registration = Registration {
            id: id.clone(),
            slot: Rc::downgrade(&slot),
        };

        let replaced = {
            let mut state = self.state.borrow_mut();
            let replaced = state.callbacks.insert(id.clone(), slot);
            if !state.running {
                state.start();
            }
            replaced
        };

        if replaced.is_some() {
            log::trace!("frame callback `{id}` replaced");
        } else {
            log::trace!("frame callback `{id}` registered");
        }
        // Dropped outside the borrow: captured state may unregister on drop.
        drop(replaced);
        registration
    }

    /// Removes the callback registered under `id`. Unknown ids are ignored.
    ///
    /// Removing the last callback stops the loop and cancels the pending frame.
    pub fn unregister(&self, id: &str) {
        self.remove_where(id, |_| true);
    }

    /// Unregisters `registration` if it is still the callback registered under its
    /// id. Returns `false` when it was already removed or superseded.
    pub fn revoke(&self, registration: &Registration) -> bool {
        let removed = self.remove_where(&registration.id, |slot| registration.owns(slot));
        if !removed {
            log::trace!("frame callback `{}` already superseded; kept", registration.id);
        }
        removed
    }

    fn remove_where(&self, id: &str, matches: impl FnOnce(&Slot) -> bool) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            if !state.callbacks.get(id).is_some_and(matches) {
                return false;
            }
            let removed = state.callbacks.remove(id);
            if removed.is_some() && state.callbacks.is_empty() && state.running {
                state.stop();
            }
            removed
        };

        log::trace!("frame callback `{id}` unregistered");
        drop(removed);
        true
    }

    /// Unregisters every callback and stops the loop.
    pub fn clear(&self) {
        let drained = {
            let mut state = self.state.borrow_mut();
            let drained = std::mem::take(&mut state.callbacks);
            if state.running {
                state.stop();
            }
            drained
        };

        if !drained.is_empty() {
            log::debug!("cleared {} frame callback(s)", drained.len());
        }
        drop(drained);
    }

    /// Number of distinct ids currently registered.
    pub fn callback_count(&self) -> usize {
        self.state.borrow().callbacks.len()
    }

    /// True while the frame loop is running.
    pub fn is_active(&self) -> bool {
        self.state.borrow().running
    }

    /// Frames dispatched since construction.
    pub fn frames_dispatched(&self) -> u64 {
        self.state.borrow().frames_dispatched
    }

    /// Runs one frame. Called by the platform when the requested frame fires.
    ///
    /// Every callback registered at the start of the frame is called with
    /// `(timestamp_ms, delta_ms)` unless it was removed or replaced earlier in the
    /// same frame. A callback that fails or panics is logged and skipped; the rest
    /// of the frame and the loop carry on.
    ///
    /// The process panic hook still runs for a panicking callback.
    /// [`init_logging`](crate::logging::init_logging) installs one that logs those
    /// at `debug`, since the failure is already reported here.
    pub fn dispatch_frame(&self, timestamp_ms: f64) {
        let (snapshot, delta_ms) = {
            let mut state = self.state.borrow_mut();
            state.frame_handle = None;

            if !state.running {
                log::trace!("ignoring frame at {timestamp_ms:.1}ms: loop is idle");
                return;
            }

            let delta_ms = timestamp_ms - state.last_timestamp;
            state.last_timestamp = timestamp_ms;
            state.frames_dispatched = state.frames_dispatched.wrapping_add(1);

            let snapshot: Vec<(String, Slot)> = state
                .callbacks
                .iter()
                .map(|(id, slot)| (id.clone(), Rc::clone(slot)))
                .collect();

            (snapshot, delta_ms)
        };

        for (id, slot) in &snapshot {
            if !self.is_registered(id, slot) {
                continue;
            }

            let Ok(mut callback) = slot.try_borrow_mut() else {
                log::warn!("frame callback `{id}` is already running; skipped");
                continue;
            };
            let guard = CallbackGuard::enter();
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| (*callback)(timestamp_ms, delta_ms)));
            drop(guard);
            drop(callback);

            let err = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => CallbackError::Failed(err),
                Err(payload) => CallbackError::from_panic(payload),
            };
            log::error!("frame callback `{id}` at {timestamp_ms:.1}ms: {err}");
        }

        let mut state = self.state.borrow_mut();
        if state.running && state.frame_handle.is_none() {
            let handle = state.source.request_frame();
            state.frame_handle = Some(handle);
        }
    }

    fn is_registered(&self, id: &str, slot: &Slot) -> bool {
        self.state
            .borrow()
            .callbacks
            .get(id)
            .is_some_and(|current| Rc::ptr_eq(current, slot))
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FrameScheduler")
            .field("callbacks", &state.callbacks.len())
            .field("running", &state.running)
            .field("last_timestamp", &state.last_timestamp)
            .field("frame_handle", &state.frame_handle)
            .field("frames_dispatched", &state.frames_dispatched)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::scheduler::ManualFrameSource;

    fn setup() -> (ManualFrameSource, FrameScheduler) {
        let source = ManualFrameSource::new();
        let scheduler = FrameScheduler::new(source.clone());
        (source, scheduler)
    }

    fn noop(_: f64, _: f64) -> Result<()> {
        Ok(())
    }

    type Calls = Rc<RefCell<Vec<(f64, f64)>>>;

    fn recorder() -> (Calls, impl FnMut(f64, f64) -> Result<()> + 'static) {
        let calls: Calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let callback = move |t, dt| {
            sink.borrow_mut().push((t, dt));
            Ok(())
        };
        (calls, callback)
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(f64, f64) -> Result<()> + 'static) {
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        let callback = move |_, _| {
            sink.set(sink.get() + 1);
            Ok(())
        };
        (hits, callback)
    }

    // ── start / stop ──────────────────────────────────────────────────────

    #[test]
    fn starts_idle_without_requesting_frames() {
        let (source, scheduler) = setup();
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.callback_count(), 0);
        assert_eq!(source.requests(), 0);
    }

    #[test]
    fn first_register_starts_loop() {
        let (source, scheduler) = setup();
        scheduler.register("a", noop);

        assert!(scheduler.is_active());
        assert_eq!(scheduler.callback_count(), 1);
        assert_eq!(source.requests(), 1);
        assert_eq!(source.outstanding(), 1);
    }

    #[test]
    fn register_while_running_does_not_restart() {
        let (source, scheduler) = setup();
        scheduler.register("a", noop);
        scheduler.register("b", noop);

        assert_eq!(scheduler.callback_count(), 2);
        assert_eq!(source.requests(), 1);
        assert_eq!(source.outstanding(), 1);
    }

    #[test]
    fn last_unregister_stops_loop_and_cancels_frame() {
        let (source, scheduler) = setup();
        scheduler.register("a", noop);
        scheduler.unregister("a");

        assert!(!scheduler.is_active());
        assert_eq!(scheduler.callback_count(), 0);
        assert_eq!(source.cancels(), 1);
        assert_eq!(source.outstanding(), 0);
        assert!(!source.fire(&scheduler));
    }

    #[test]
    fn clear_unregisters_everything() {
        let (source, scheduler) = setup();
        scheduler.register("a", noop);
        scheduler.register("b", noop);
        scheduler.clear();

        assert!(!scheduler.is_active());
        assert_eq!(scheduler.callback_count(), 0);
        assert_eq!(source.outstanding(), 0);
    }

    #[test]
    fn stale_frame_after_stop_is_ignored() {
        let (source, scheduler) = setup();
        scheduler.dispatch_frame(16.0);

        assert!(!scheduler.is_active());
        assert_eq!(scheduler.frames_dispatched(), 0);
        assert_eq!(source.requests(), 0);
    }

    // ── registration table ────────────────────────────────────────────────

    #[test]
    fn duplicate_id_replaces_callback() {
        let (source, scheduler) = setup();
        let (first, cb1) = counter();
        let (second, cb2) = counter();
        scheduler.register("a", cb1);
        scheduler.register("a", cb2);

        assert_eq!(scheduler.callback_count(), 1);
        source.advance(16.0);
        source.fire(&scheduler);

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn unregister_unknown_id_is_noop() {
        let (source, scheduler) = setup();
        scheduler.unregister("ghost");
        scheduler.register("a", noop);
        scheduler.unregister("ghost");

        assert_eq!(scheduler.callback_count(), 1);
        assert!(scheduler.is_active());
        assert_eq!(source.cancels(), 0);
    }

    #[test]
    fn unregister_twice_removes_once() {
        let (source, scheduler) = setup();
        scheduler.register("a", noop);
        scheduler.register("b", noop);
        scheduler.unregister("a");
        scheduler.unregister("a");

        assert_eq!(scheduler.callback_count(), 1);
        assert!(scheduler.is_active());
        assert_eq!(source.cancels(), 0);
    }

    #[test]
    fn at_most_one_frame_outstanding() {
        let (source, scheduler) = setup();
        let ids = ["a", "b", "c"];

        for step in 0..60_usize {
            let id = ids[step % ids.len()];
            match step % 4 {
                0 | 1 => {
                    scheduler.register(id, noop);
                }
                2 => scheduler.unregister(id),
                _ => {
                    source.advance(16.0);
                    source.fire(&scheduler);
                }
            }
            assert!(source.outstanding() <= 1);
            assert_eq!(source.outstanding() == 1, scheduler.is_active());
        }
        assert!(source.max_outstanding() <= 1);
    }

    // ── dispatch ──────────────────────────────────────────────────────────

    #[test]
    fn delta_is_time_since_previous_frame() {
        let (source, scheduler) = setup();
        source.set_now(100.0);
        let (calls, cb) = recorder();
        scheduler.register("a", cb);

        for t in [116.0, 133.0, 150.0] {
            source.set_now(t);
            source.fire(&scheduler);
        }

        assert_eq!(*calls.borrow(), vec![(116.0, 16.0), (133.0, 17.0), (150.0, 17.0)]);
    }

    #[test]
    fn restart_resets_time_baseline() {
        let (source, scheduler) = setup();
        scheduler.register("a", noop);
        source.set_now(16.0);
        source.fire(&scheduler);
        scheduler.unregister("a");

        source.set_now(5_000.0);
        let (calls, cb) = recorder();
        scheduler.register("a", cb);
        source.advance(16.0);
        source.fire(&scheduler);

        assert_eq!(*calls.borrow(), vec![(5_016.0, 16.0)]);
    }

    #[test]
    fn register_while_running_keeps_baseline() {
        let (source, scheduler) = setup();
        let (calls, cb) = recorder();
        scheduler.register("a", cb);
        source.set_now(10.0);
        scheduler.register("b", noop);
        source.set_now(16.0);
        source.fire(&scheduler);

        assert_eq!(*calls.borrow(), vec![(16.0, 16.0)]);
    }

    #[test]
    fn failing_callback_does_not_stop_others() {
        let (source, scheduler) = setup();
        let (first, cb1) = counter();
        let (third, cb3) = counter();
        scheduler.register("first", cb1);
        scheduler.register("broken", |_, _| Err(anyhow::anyhow!("always fails")));
        scheduler.register("third", cb3);

        for _ in 0..10 {
            source.advance(16.0);
            assert!(source.fire(&scheduler));
        }

        assert_eq!(first.get(), 10);
        assert_eq!(third.get(), 10);
        assert_eq!(scheduler.callback_count(), 3);
        assert!(scheduler.is_active());
    }

    #[test]
    fn panicking_callback_does_not_stop_others() {
        let (source, scheduler) = setup();
        let (first, cb1) = counter();
        let (third, cb3) = counter();
        scheduler.register("first", cb1);
        scheduler.register("broken", |_, _| -> Result<()> { panic!("always panics") });
        scheduler.register("third", cb3);

        for _ in 0..5 {
            source.advance(16.0);
            assert!(source.fire(&scheduler));
        }

        assert_eq!(first.get(), 5);
        assert_eq!(third.get(), 5);
        assert_eq!(scheduler.callback_count(), 3);
        assert_eq!(source.outstanding(), 1);
    }

    #[test]
    fn callback_unregistering_itself_stops_loop() {
        let (source, scheduler) = setup();
        let handle = scheduler.clone();
        scheduler.register("once", move |_, _| {
            handle.unregister("once");
            Ok(())
        });

        source.advance(16.0);
        source.fire(&scheduler);

        assert!(!scheduler.is_active());
        assert_eq!(source.outstanding(), 0);
        assert!(!source.fire(&scheduler));
    }

    #[test]
    fn callback_removed_mid_frame_is_skipped() {
        let (source, scheduler) = setup();
        let (victim, cb) = counter();
        let handle = scheduler.clone();
        scheduler.register("victim", cb);
        scheduler.register("killer", move |_, _| {
            handle.unregister("victim");
            Ok(())
        });

        for _ in 0..3 {
            source.advance(16.0);
            source.fire(&scheduler);
        }

        // Dispatch order is unspecified: the victim runs at most in the first frame.
        assert!(victim.get() <= 1);
        assert_eq!(scheduler.callback_count(), 1);
    }

    #[test]
    fn callback_added_mid_frame_runs_next_frame() {
        let (source, scheduler) = setup();
        let (child, child_cb) = counter();
        let mut child_cb = Some(child_cb);
        let handle = scheduler.clone();
        scheduler.register("spawner", move |_, _| {
            if let Some(cb) = child_cb.take() {
                handle.register("child", cb);
            }
            Ok(())
        });

        source.advance(16.0);
        source.fire(&scheduler);
        assert_eq!(child.get(), 0);

        source.advance(16.0);
        source.fire(&scheduler);
        assert_eq!(child.get(), 1);
        assert_eq!(source.outstanding(), 1);
    }

    #[test]
    fn emptying_and_refilling_mid_frame_requests_one_frame() {
        let (source, scheduler) = setup();
        let (calls, cb) = recorder();
        let mut next = Some(cb);
        let handle = scheduler.clone();
        scheduler.register("a", move |_, _| {
            handle.unregister("a");
            if let Some(cb) = next.take() {
                handle.register("b", cb);
            }
            Ok(())
        });

        source.set_now(16.0);
        source.fire(&scheduler);
        assert!(scheduler.is_active());
        assert_eq!(source.outstanding(), 1);

        source.set_now(40.0);
        source.fire(&scheduler);
        // Baseline was reset when "b" restarted the loop at 16ms.
        assert_eq!(*calls.borrow(), vec![(40.0, 24.0)]);
    }

    // ── registrations ─────────────────────────────────────────────────────

    #[test]
    fn revoke_removes_current_registration() {
        let (source, scheduler) = setup();
        let registration = scheduler.register("a", noop);
        assert_eq!(registration.id(), "a");

        assert!(scheduler.revoke(&registration));
        assert_eq!(scheduler.callback_count(), 0);
        assert!(!scheduler.is_active());
        assert_eq!(source.outstanding(), 0);

        assert!(!scheduler.revoke(&registration));
    }

    #[test]
    fn revoking_superseded_registration_keeps_newer_callback() {
        let (source, scheduler) = setup();
        let old = scheduler.register("a", noop);
        let (hits, cb) = counter();
        let live = scheduler.register("a", cb);

        assert!(!scheduler.revoke(&old));
        assert_eq!(scheduler.callback_count(), 1);
        assert!(scheduler.is_active());

        source.advance(16.0);
        source.fire(&scheduler);
        assert_eq!(hits.get(), 1);

        assert!(scheduler.revoke(&live));
        assert!(!scheduler.is_active());
    }

    #[test]
    fn revoke_after_unregister_and_reregister_is_noop() {
        let (_source, scheduler) = setup();
        let old = scheduler.register("a", noop);
        scheduler.unregister("a");
        scheduler.register("a", noop);

        assert!(!scheduler.revoke(&old));
        assert_eq!(scheduler.callback_count(), 1);
    }

    #[test]
    fn in_callback_only_during_dispatch() {
        let (source, scheduler) = setup();
        let seen = Rc::new(Cell::new(false));
        let sink = Rc::clone(&seen);
        scheduler.register("watcher", move |_, _| {
            sink.set(in_callback());
            Ok(())
        });
        scheduler.register("boom", |_, _| panic!("boom"));

        assert!(!in_callback());
        source.advance(16.0);
        source.fire(&scheduler);
        assert!(seen.get());
        assert!(!in_callback());
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn register_dispatch_unregister_scenario() {
        let (source, scheduler) = setup();
        let (calls, cb) = recorder();

        source.set_now(0.0);
        scheduler.register("a", cb);
        assert!(scheduler.is_active());
        assert_eq!(scheduler.callback_count(), 1);

        source.set_now(16.0);
        source.fire(&scheduler);
        assert_eq!(*calls.borrow(), vec![(16.0, 16.0)]);

        source.set_now(20.0);
        scheduler.register("b", noop);
        assert_eq!(scheduler.callback_count(), 2);
        assert_eq!(source.requests(), 2);

        scheduler.unregister("a");
        assert_eq!(scheduler.callback_count(), 1);
        assert!(scheduler.is_active());

        scheduler.unregister("b");
        assert_eq!(scheduler.callback_count(), 0);
        assert!(!scheduler.is_active());
        assert!(!source.fire(&scheduler));
        assert_eq!(calls.borrow().len(), 1);
    }
}
