use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::anyhow;

use cadence_engine::paint::{Canvas, Color, SharedCanvas};
use cadence_engine::scheduler::{FrameScheduler, Registration};
use cadence_engine::time::DeltaClamp;

use crate::pointer::Glow;
use crate::rng::XorShift64;

/// Scheduler id of the particle-field callback.
pub const PARTICLES_ID: &str = "particles";

#[derive(Debug, Clone)]
pub struct ParticleConfig {
    pub count: usize,
    /// Redraw rate. The simulation still advances every frame.
    pub target_fps: f64,
    /// Pixels per second.
    pub max_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// How far the field shifts per pixel of scroll offset.
    pub parallax: f32,
    pub background: Color,
    pub color: Color,
    pub glow_color: Color,
    pub glow_radius: f32,
    pub seed: u64,
    pub clamp: DeltaClamp,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 160,
            target_fps: 30.0,
            max_speed: 40.0,
            min_radius: 1.0,
            max_radius: 2.5,
            parallax: 0.3,
            background: Color::rgb(8, 10, 20),
            color: Color::rgb(150, 180, 255),
            glow_color: Color::rgba(120, 90, 255, 60),
            glow_radius: 90.0,
            seed: 0x5eed,
            clamp: DeltaClamp::default(),
        }
    }
}

/// One particle, in canvas pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

struct FieldState {
    config: ParticleConfig,
    particles: Vec<Particle>,
    width: f32,
    height: f32,
    /// Milliseconds since the last redraw, modulo the frame budget.
    accumulator: f64,
    budget_ms: f64,
    draws: u64,
    scroll: Option<Rc<Cell<f32>>>,
    glow: Option<Rc<Cell<Option<Glow>>>>,
}

impl FieldState {
    fn new(config: ParticleConfig, width: f32, height: f32) -> Self {
        let mut rng = XorShift64::new(config.seed);
        let particles = (0..config.count)
            .map(|_| {
                let angle = rng.range(0.0, std::f32::consts::TAU);
                let speed = rng.range(0.2, 1.0) * config.max_speed;
                Particle {
                    x: rng.range(0.0, width.max(1.0)),
                    y: rng.range(0.0, height.max(1.0)),
                    vx: angle.cos() * speed,
                    vy: angle.sin() * speed,
                    radius: rng.range(config.min_radius, config.max_radius),
                }
            })
            .collect();

        let budget_ms = if config.target_fps > 0.0 { 1_000.0 / config.target_fps } else { 0.0 };

        Self {
            config,
            particles,
            width,
            height,
            accumulator: 0.0,
            budget_ms,
            draws: 0,
            scroll: None,
            glow: None,
        }
    }

    fn simulate(&mut self, delta_ms: f64) {
        let dt = (delta_ms / 1_000.0) as f32;
        let (w, h) = (self.width, self.height);
        for p in &mut self.particles {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            if w > 0.0 {
                p.x = p.x.rem_euclid(w);
            }
            if h > 0.0 {
                p.y = p.y.rem_euclid(h);
            }
        }
    }

    /// Accumulates `delta_ms`; `true` when a redraw is due.
    fn due(&mut self, delta_ms: f64) -> bool {
        self.accumulator += delta_ms;
        if self.accumulator < self.budget_ms {
            return false;
        }
        self.accumulator = if self.budget_ms > 0.0 { self.accumulator % self.budget_ms } else { 0.0 };
        true
    }

    /// Adopts new bounds, scaling positions so the field keeps its distribution.
    ///
    /// A zero-sized canvas (minimized window) keeps the previous bounds, so the
    /// field comes back unchanged on restore.
    fn fit(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        if width == self.width && height == self.height {
            return;
        }
        // A field seeded over an empty canvas was seeded over the unit square.
        let sx = if self.width > 0.0 { width / self.width } else { width };
        let sy = if self.height > 0.0 { height / self.height } else { height };
        for p in &mut self.particles {
            p.x *= sx;
            p.y *= sy;
        }
        self.width = width;
        self.height = height;
    }

    fn draw(&mut self, canvas: &mut Canvas) {
        self.fit(canvas.width() as f32, canvas.height() as f32);

        canvas.clear(self.config.background);

        if let Some(glow) = self.glow.as_ref().and_then(|g| g.get()) {
            let alpha = (self.config.glow_color.a as f32 * glow.intensity).round() as u8;
            canvas.fill_disc(
                glow.x,
                glow.y,
                self.config.glow_radius,
                self.config.glow_color.with_alpha(alpha),
            );
        }

        let shift = self.scroll.as_ref().map_or(0.0, |s| s.get()) * self.config.parallax;
        for p in &self.particles {
            let y = if self.height > 0.0 { (p.y - shift).rem_euclid(self.height) } else { p.y };
            canvas.fill_disc(p.x, y, p.radius, self.config.color);
        }

        self.draws += 1;
    }
}

/// Drifting particle field with a throttled redraw.
///
/// The simulation advances on every frame; drawing into the canvas happens at most
/// `target_fps` times per second. Registered for its whole lifetime, unregistered
/// on drop.
pub struct ParticleField {
    scheduler: FrameScheduler,
    registration: Registration,
    state: Rc<RefCell<FieldState>>,
}

impl ParticleField {
    /// Seeds the field over the canvas area and registers its callback.
    pub fn mount(scheduler: &FrameScheduler, canvas: SharedCanvas, config: ParticleConfig) -> Self {
        let (width, height) = {
            let canvas = canvas.borrow();
            (canvas.width() as f32, canvas.height() as f32)
        };
        let clamp = config.clamp;
        let state = Rc::new(RefCell::new(FieldState::new(config, width, height)));

        let registration = {
            let state = Rc::clone(&state);
            scheduler.register(PARTICLES_ID, move |_, delta_ms| {
                let delta_ms = clamp.apply(delta_ms);
                let mut state = state.borrow_mut();
                state.simulate(delta_ms);

                if !state.due(delta_ms) {
                    return Ok(());
                }

                let mut canvas = canvas
                    .try_borrow_mut()
                    .map_err(|_| anyhow!("canvas is borrowed elsewhere; redraw skipped"))?;
                state.draw(&mut canvas);
                Ok(())
            })
        };

        Self {
            scheduler: scheduler.clone(),
            registration,
            state,
        }
    }

    /// Shifts the field vertically with the given scroll offset.
    pub fn follow_scroll(&self, offset: Rc<Cell<f32>>) {
        self.state.borrow_mut().scroll = Some(offset);
    }

    /// Draws a halo under the given glow whenever one is published.
    pub fn follow_glow(&self, glow: Rc<Cell<Option<Glow>>>) {
        self.state.borrow_mut().glow = Some(glow);
    }

    /// Redraws completed so far.
    pub fn draw_count(&self) -> u64 {
        self.state.borrow().draws
    }

    pub fn particles(&self) -> Vec<Particle> {
        self.state.borrow().particles.clone()
    }
}

impl Drop for ParticleField {
    fn drop(&mut self) {
        self.scheduler.revoke(&self.registration);
    }
}
