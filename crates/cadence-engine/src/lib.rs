//! Cadence engine crate.
//!
//! One animation-frame loop shared by every per-frame consumer, plus the platform
//! pieces that drive it: a winit runtime that turns frame requests into redraws and
//! a softbuffer presenter for the CPU canvas consumers draw into.

pub mod core;
pub mod input;
pub mod logging;
pub mod paint;
pub mod scheduler;
pub mod time;
pub mod window;
