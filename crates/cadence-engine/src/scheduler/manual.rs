use std::cell::RefCell;
use std::rc::Rc;

use super::frame_scheduler::FrameScheduler;
use super::source::{FrameHandle, FrameSource};

#[derive(Debug, Default)]
struct ManualState {
    now: f64,
    next_id: u64,
    pending: Vec<FrameHandle>,
    requests: u64,
    cancels: u64,
    max_outstanding: usize,
}

/// Hand-driven `FrameSource` for tests and headless use.
///
/// Time only moves when told to, and frames only fire through [`fire`](Self::fire).
/// Clones share state, so a test keeps one clone while the scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameSource {
    state: Rc<RefCell<ManualState>>,
}

impl ManualFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&self, now_ms: f64) {
        self.state.borrow_mut().now = now_ms;
    }

    pub fn advance(&self, delta_ms: f64) {
        self.state.borrow_mut().now += delta_ms;
    }

    pub fn now_ms(&self) -> f64 {
        self.state.borrow().now
    }

    /// Total frame requests made so far.
    pub fn requests(&self) -> u64 {
        self.state.borrow().requests
    }

    /// Total requests cancelled before firing.
    pub fn cancels(&self) -> u64 {
        self.state.borrow().cancels
    }

    /// Requests neither fired nor cancelled.
    pub fn outstanding(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Highest `outstanding()` value ever observed.
    pub fn max_outstanding(&self) -> usize {
        self.state.borrow().max_outstanding
    }

    /// Fires the oldest pending frame at the current mock time.
    ///
    /// Returns `false` when no frame was pending.
    pub fn fire(&self, scheduler: &FrameScheduler) -> bool {
        let now = {
            let mut state = self.state.borrow_mut();
            if state.pending.is_empty() {
                return false;
            }
            state.pending.remove(0);
            state.now
        };

        scheduler.dispatch_frame(now);
        true
    }
}

impl FrameSource for ManualFrameSource {
    fn now(&self) -> f64 {
        self.now_ms()
    }

    fn request_frame(&mut self) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let handle = FrameHandle::new(state.next_id);
        state.pending.push(handle);
        state.requests += 1;
        state.max_outstanding = state.max_outstanding.max(state.pending.len());
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(pos) = state.pending.iter().position(|h| *h == handle) {
            state.pending.remove(pos);
            state.cancels += 1;
        }
    }
}
