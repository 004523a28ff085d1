//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and the application
//! that mounts frame consumers. Applications never see winit or softbuffer types.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::AppCtx;
