use std::cell::RefCell;

use super::frame_scheduler::FrameScheduler;

thread_local! {
    static CURRENT: RefCell<Option<FrameScheduler>> = const { RefCell::new(None) };
}

/// Installs `scheduler` as this thread's process-wide scheduler.
///
/// Returns the previously installed scheduler, if any. Prefer passing the handle
/// explicitly; this slot is for code that cannot be handed one.
pub fn install(scheduler: FrameScheduler) -> Option<FrameScheduler> {
    CURRENT.with(|slot| slot.borrow_mut().replace(scheduler))
}

/// Returns a handle to the installed scheduler.
pub fn current() -> Option<FrameScheduler> {
    CURRENT.with(|slot| slot.borrow().clone())
}

/// Unregisters everything on the installed scheduler and empties the slot.
pub fn shutdown() {
    let scheduler = CURRENT.with(|slot| slot.borrow_mut().take());
    if let Some(scheduler) = scheduler {
        scheduler.clear();
    }
}
