//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! `platform::winit` translates window events into `InputEvent`s for the runtime.

pub(crate) mod platform {
    pub(crate) mod winit;
}

mod region;
mod types;

pub use region::Region;
pub use types::{InputEvent, LINE_HEIGHT_PX};
