use winit::window::Window;

use crate::paint::SharedCanvas;
use crate::scheduler::FrameScheduler;

/// Context passed to every `core::App` callback.
pub struct AppCtx<'a> {
    pub scheduler: &'a FrameScheduler,
    pub canvas: &'a SharedCanvas,
    window: &'a Window,
}

impl<'a> AppCtx<'a> {
    pub(crate) fn new(
        scheduler: &'a FrameScheduler,
        canvas: &'a SharedCanvas,
        window: &'a Window,
    ) -> Self {
        Self { scheduler, canvas, window }
    }

    /// Surface size in physical pixels, the canvas resolution.
    pub fn surface_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}
