use std::cell::RefCell;
use std::rc::Rc;

use super::Color;

/// Canvas shared between frame consumers and the runtime presenter.
pub type SharedCanvas = Rc<RefCell<Canvas>>;

/// CPU pixel buffer in `0x00RRGGBB` layout, row-major, top-left origin.
///
/// Every drawing call clips to the canvas bounds and marks it dirty.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    dirty: bool,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            dirty: true,
        }
    }

    pub fn into_shared(self) -> SharedCanvas {
        Rc::new(RefCell::new(self))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Reallocates to `width × height`, cleared to black.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize, 0);
        self.dirty = true;
    }

    /// Returns whether anything was drawn since the last call, and resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_pixel());
        self.dirty = true;
    }

    /// Fills the rectangle `[x, x+w) × [y, y+h)`, compositing when `color` is translucent.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x as i64 + w as i64).clamp(0, self.width as i64) as u32;
        let y1 = (y as i64 + h as i64).clamp(0, self.height as i64) as u32;

        for py in y0..y1 {
            for px in x0..x1 {
                self.put(px, py, color);
            }
        }
        self.dirty = true;
    }

    /// Fills a disc centred at `(cx, cy)`. A pixel is covered when its centre lies
    /// within `radius`.
    pub fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 || !cx.is_finite() || !cy.is_finite() {
            return;
        }

        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((cy + radius).ceil().max(0.0) as u32).min(self.height);
        let r2 = radius * radius;

        for py in y0..y1 {
            let dy = py as f32 + 0.5 - cy;
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.put(px, py, color);
                }
            }
        }
        self.dirty = true;
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    fn put(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        if let Some(dst) = self.pixels.get_mut(i) {
            *dst = color.over(*dst);
        }
    }
}
