//! Time subsystem.
//!
//! Provides the millisecond timebase shared by the frame scheduler and its consumers.
//! Intended usage:
//! - one `FrameClock` per platform loop, read when a frame fires
//! - consumers clamp the scheduler's raw `delta_ms` with a `DeltaClamp` before
//!   integrating physics
//! - a `FramePacer` spaces platform frames one display refresh apart

mod frame_clock;
mod frame_pacer;

pub use frame_clock::{DeltaClamp, FrameClock};
pub use frame_pacer::{FramePacer, FALLBACK_REFRESH_HZ};
