/// Pixels scrolled per wheel "line" when the platform reports line deltas.
pub const LINE_HEIGHT_PX: f32 = 40.0;

/// Platform-agnostic input event, in physical surface pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    PointerMoved { x: f32, y: f32 },
    /// The pointer left the window.
    PointerLeft,
    /// Vertical wheel motion; positive scrolls content down the page.
    Wheel { dy: f32 },
    Resized { width: u32, height: u32 },
}
