//! Cadence effects — per-frame consumers of the engine's `FrameScheduler`.
//!
//! Each effect registers one named callback when mounted and unregisters it when
//! dropped. None depends on running before or after another; they share state only
//! through cells read on the next frame.
//!
//! ```rust,ignore
//! let scroll = ScrollPhysics::mount(ctx.scheduler, ScrollConfig::default(), 2_000.0);
//! let field = ParticleField::mount(ctx.scheduler, ctx.canvas.clone(), ParticleConfig::default());
//! field.follow_scroll(scroll.offset_cell());
//! ```

mod ease;
pub mod overlay;
pub mod particles;
pub mod pointer;
mod rng;
pub mod scroll;

pub use overlay::{DebugOverlay, OverlayReport};
pub use particles::{Particle, ParticleConfig, ParticleField, PARTICLES_ID};
pub use pointer::{Glow, PointerConfig, PointerTracker, POINTER_ID};
pub use scroll::{ScrollConfig, ScrollPhysics, SCROLL_ID};
