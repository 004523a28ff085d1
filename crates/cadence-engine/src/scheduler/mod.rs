//! Frame scheduler.
//!
//! One animation-frame loop for the whole application, shared by any number of
//! per-frame consumers. Intended usage:
//! - construct one `FrameScheduler` at startup over the platform's `FrameSource`
//! - consumers `register` a named callback at mount and `revoke` the returned
//!   `Registration` (or `unregister` the id) at teardown
//! - the platform calls `dispatch_frame` when the requested frame fires
//!
//! The loop runs iff at least one callback is registered.

mod error;
mod frame_scheduler;
mod global;
mod manual;
mod source;

pub use error::CallbackError;
pub use frame_scheduler::{in_callback, FrameCallback, FrameScheduler, Registration};
pub use global::{current, install, shutdown};
pub use manual::ManualFrameSource;
pub use source::{FrameHandle, FrameSource};
