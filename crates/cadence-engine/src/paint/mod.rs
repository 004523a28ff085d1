//! CPU painting.
//!
//! Consumers draw into a shared [`Canvas`] from their frame callbacks; the runtime
//! presents it through softbuffer after the frame's dispatch when it is dirty.

mod canvas;
mod color;

pub use canvas::{Canvas, SharedCanvas};
pub use color::Color;
