use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use winit::window::Window;

use crate::scheduler::{FrameHandle, FrameSource};
use crate::time::{FrameClock, FramePacer};

#[derive(Default)]
struct Shared {
    window: Option<Rc<Window>>,
    pending: Option<FrameHandle>,
    /// When the pending frame may run.
    deadline: Option<Instant>,
    /// `request_redraw` was issued for the pending frame.
    redraw_requested: bool,
    pacer: FramePacer,
    next_id: u64,
}

/// `FrameSource` backed by winit redraw requests, paced to the display refresh.
///
/// A frame request schedules a deadline one refresh after the previous frame.
/// The runtime calls [`poll_frame`](Self::poll_frame) before the loop sleeps:
/// once the deadline has passed it issues `Window::request_redraw`, otherwise it
/// returns the deadline to wait for. The next `RedrawRequested` at or after the
/// deadline is handed to the scheduler.
#[derive(Clone)]
pub struct WinitFrameSource {
    shared: Rc<RefCell<Shared>>,
    clock: FrameClock,
}

impl WinitFrameSource {
    pub fn new(clock: FrameClock) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared::default())),
            clock,
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub(crate) fn set_pacer(&self, pacer: FramePacer) {
        self.shared.borrow_mut().pacer = pacer;
    }

    pub(crate) fn attach(&self, window: Rc<Window>) {
        let mut shared = self.shared.borrow_mut();
        shared.redraw_requested = false;
        shared.window = Some(window);
    }

    pub(crate) fn detach(&self) {
        let mut shared = self.shared.borrow_mut();
        shared.window = None;
        shared.redraw_requested = false;
    }

    /// Requests a redraw if the pending frame is due at `now`.
    ///
    /// Returns the deadline the event loop should wake at, or `None` when there is
    /// nothing to wait for.
    pub(crate) fn poll_frame(&self, now: Instant) -> Option<Instant> {
        let mut shared = self.shared.borrow_mut();
        if shared.pending.is_none() || shared.redraw_requested {
            return None;
        }

        let deadline = shared.deadline?;
        if now < deadline {
            return Some(deadline);
        }

        let window = shared.window.clone()?;
        shared.redraw_requested = true;
        drop(shared);

        window.request_redraw();
        None
    }

    /// Consumes the pending request if it is due at `now`. `true` means this redraw
    /// is a scheduler frame.
    pub(crate) fn take_due(&self, now: Instant) -> bool {
        let mut shared = self.shared.borrow_mut();
        let due = shared.redraw_requested || shared.deadline.is_some_and(|d| d <= now);
        if shared.pending.is_none() || !due {
            return false;
        }

        shared.pending = None;
        shared.deadline = None;
        shared.redraw_requested = false;
        shared.pacer.mark(now);
        true
    }
}

impl FrameSource for WinitFrameSource {
    fn now(&self) -> f64 {
        self.now_ms()
    }

    fn request_frame(&mut self) -> FrameHandle {
        let mut shared = self.shared.borrow_mut();
        shared.next_id += 1;
        let handle = FrameHandle::new(shared.next_id);
        shared.pending = Some(handle);
        shared.deadline = Some(shared.pacer.next_deadline(Instant::now()));
        shared.redraw_requested = false;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut shared = self.shared.borrow_mut();
        // winit cannot withdraw a redraw request; if one was issued it still
        // arrives but is not treated as a frame.
        if shared.pending == Some(handle) {
            shared.pending = None;
            shared.deadline = None;
            shared.redraw_requested = false;
        }
    }
}
