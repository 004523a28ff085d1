use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;

use cadence_effects::{
    DebugOverlay, ParticleConfig, ParticleField, PointerConfig, PointerTracker, ScrollConfig,
    ScrollPhysics,
};
use cadence_engine::core::{App, AppControl, AppCtx};
use cadence_engine::input::{InputEvent, Region};
use cadence_engine::logging::{init_logging, LoggingConfig};
use cadence_engine::time::FrameClock;
use cadence_engine::window::{Runtime, RuntimeConfig};

const TITLE: &str = "Cadence Studio";

/// Virtual page height, in screens, the scroll physics can travel.
const PAGE_SCREENS: f32 = 4.0;

fn scroll_range(height: u32) -> f32 {
    height as f32 * (PAGE_SCREENS - 1.0)
}

/// The pointer glow only follows the cursor inside the hero area.
fn hero_region(width: u32, height: u32) -> Region {
    let margin = width.min(height) as f32 * 0.1;
    Region::new(0.0, 0.0, width as f32, height as f32).inset(margin)
}

struct Effects {
    // Dropped first: the pointer may still hold a registration.
    pointer: PointerTracker,
    field: ParticleField,
    scroll: ScrollPhysics,
}

struct Studio {
    clock: FrameClock,
    debug_overlay: bool,
    overlay: Option<DebugOverlay>,
    effects: Option<Effects>,
}

impl Studio {
    fn new(debug_overlay: bool) -> Self {
        Self {
            clock: FrameClock::new(),
            debug_overlay,
            overlay: None,
            effects: None,
        }
    }
}

impl App for Studio {
    fn on_start(&mut self, ctx: &mut AppCtx<'_>) -> Result<()> {
        let (width, height) = ctx.surface_size();

        let scroll = ScrollPhysics::mount(ctx.scheduler, ScrollConfig::default(), scroll_range(height));
        let field = ParticleField::mount(ctx.scheduler, Rc::clone(ctx.canvas), ParticleConfig::default());
        let pointer = PointerTracker::new(
            ctx.scheduler,
            PointerConfig {
                region: hero_region(width, height),
                ..PointerConfig::default()
            },
        );

        field.follow_scroll(scroll.offset_cell());
        field.follow_glow(pointer.glow_cell());

        if self.debug_overlay {
            self.overlay = Some(DebugOverlay::new(ctx.scheduler));
        }

        self.effects = Some(Effects { pointer, field, scroll });
        log::info!("studio mounted at {width}x{height}");
        Ok(())
    }

    fn on_input(&mut self, event: InputEvent, _ctx: &mut AppCtx<'_>) -> AppControl {
        let Some(fx) = self.effects.as_mut() else {
            return AppControl::Continue;
        };

        match event {
            InputEvent::PointerMoved { x, y } => fx.pointer.on_pointer_moved(x, y),
            InputEvent::PointerLeft => fx.pointer.on_pointer_left(),
            InputEvent::Wheel { dy } => fx.scroll.on_wheel(dy),
            InputEvent::Resized { width, height } => {
                fx.scroll.set_max_offset(scroll_range(height));
                fx.pointer.set_region(hero_region(width, height));
            }
        }
        AppControl::Continue
    }

    fn on_poll(&mut self, ctx: &mut AppCtx<'_>) -> AppControl {
        if let Some(overlay) = self.overlay.as_mut() {
            let report = overlay.poll(self.clock.now_ms());
            ctx.set_title(&format!("{TITLE} | {report}"));
        }
        AppControl::Continue
    }

    fn on_shutdown(&mut self, _ctx: &mut AppCtx<'_>) {
        if let Some(fx) = self.effects.take() {
            log::info!("studio unmounting after {} particle redraw(s)", fx.field.draw_count());
        }
        self.overlay = None;
    }
}

fn debug_overlay_requested() -> bool {
    std::env::args().skip(1).any(|arg| arg == "--debug-overlay")
        || std::env::var("CADENCE_DEBUG_OVERLAY").is_ok_and(|v| v == "1" || v == "true")
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let debug_overlay = debug_overlay_requested();
    let config = RuntimeConfig {
        title: TITLE.to_string(),
        poll_interval: debug_overlay.then_some(Duration::from_secs(1)),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, Studio::new(debug_overlay))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hero_region_is_inset() {
        let r = hero_region(1000, 500);
        assert_eq!(r, Region::new(50.0, 50.0, 900.0, 400.0));
        assert!(r.contains(500.0, 250.0));
        assert!(!r.contains(10.0, 10.0));
    }

    #[test]
    fn scroll_range_spans_remaining_screens() {
        assert_eq!(scroll_range(600), 1_800.0);
        assert_eq!(scroll_range(0), 0.0);
    }
}
