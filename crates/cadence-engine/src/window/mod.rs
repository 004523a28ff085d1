//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, backs the frame scheduler with
//! `Window::request_redraw` paced to the monitor refresh, and presents the shared
//! canvas through softbuffer.

mod frame_source;
mod present;
mod runtime;

pub use frame_source::WinitFrameSource;
pub use runtime::{Runtime, RuntimeConfig};
