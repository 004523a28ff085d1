use std::num::NonZeroU32;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use winit::window::Window;

use crate::paint::Canvas;

/// Copies the CPU canvas onto the window through softbuffer.
pub(crate) struct Presenter {
    // Kept alive for the surface's display connection.
    _context: softbuffer::Context<Rc<Window>>,
    surface: softbuffer::Surface<Rc<Window>, Rc<Window>>,
    size: (u32, u32),
}

impl Presenter {
    pub(crate) fn new(window: &Rc<Window>) -> Result<Self> {
        let context = softbuffer::Context::new(Rc::clone(window))
            .map_err(|e| anyhow!("failed to create softbuffer context: {e}"))?;
        let surface = softbuffer::Surface::new(&context, Rc::clone(window))
            .map_err(|e| anyhow!("failed to create softbuffer surface: {e}"))?;

        Ok(Self {
            _context: context,
            surface,
            size: (0, 0),
        })
    }

    /// Resizes the surface. Zero-sized surfaces (minimized windows) are skipped.
    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            self.size = (0, 0);
            return Ok(());
        };

        self.surface
            .resize(w, h)
            .map_err(|e| anyhow!("failed to resize surface to {width}x{height}: {e}"))?;
        self.size = (width, height);
        Ok(())
    }

    /// Presents `canvas`. Skipped while the canvas and surface sizes disagree.
    pub(crate) fn present(&mut self, canvas: &Canvas) -> Result<()> {
        if self.size == (0, 0) || self.size != (canvas.width(), canvas.height()) {
            log::trace!(
                "present skipped: surface {:?}, canvas {}x{}",
                self.size,
                canvas.width(),
                canvas.height()
            );
            return Ok(());
        }

        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| anyhow!("failed to acquire surface buffer: {e}"))?;
        buffer.copy_from_slice(canvas.pixels());
        buffer
            .present()
            .map_err(|e| anyhow!("failed to present surface buffer: {e}"))?;
        Ok(())
    }
}
