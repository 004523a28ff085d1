use anyhow::Result;

use crate::input::InputEvent;

use super::ctx::AppCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Per-frame work does not go through this trait: the app registers callbacks on
/// `ctx.scheduler` and the runtime drives them.
pub trait App {
    /// Called once, after the window and canvas exist. Mount frame consumers here.
    fn on_start(&mut self, ctx: &mut AppCtx<'_>) -> Result<()>;

    /// Called for pointer, wheel and resize input.
    fn on_input(&mut self, event: InputEvent, ctx: &mut AppCtx<'_>) -> AppControl {
        let _ = (event, ctx);
        AppControl::Continue
    }

    /// Called every `RuntimeConfig::poll_interval`, whether or not the frame loop runs.
    fn on_poll(&mut self, ctx: &mut AppCtx<'_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Called before the runtime clears the scheduler and exits.
    fn on_shutdown(&mut self, ctx: &mut AppCtx<'_>) {
        let _ = ctx;
    }
}
