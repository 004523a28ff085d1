use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, AppCtx};
use crate::input::platform::winit::translate_window_event;
use crate::input::InputEvent;
use crate::paint::{Canvas, SharedCanvas};
use crate::scheduler::{self, FrameScheduler};
use crate::time::{FrameClock, FramePacer};

use super::frame_source::WinitFrameSource;
use super::present::Presenter;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Interval for `App::on_poll`. `None` disables polling.
    pub poll_interval: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "cadence".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            poll_interval: None,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `app` until its window closes or it asks to exit.
    ///
    /// The runtime's scheduler is installed as the thread's process-wide
    /// scheduler for the duration of the call.
    pub fn run<A>(config: RuntimeConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, app);
        scheduler::install(state.scheduler.clone());

        let outcome = event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error");

        scheduler::shutdown();
        outcome?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct Live {
    window: Rc<Window>,
    presenter: Presenter,
    /// Present on the next redraw even if the canvas is clean.
    force_present: bool,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    app: A,

    source: WinitFrameSource,
    scheduler: FrameScheduler,
    canvas: SharedCanvas,

    live: Option<Live>,
    started: bool,
    next_poll: Option<Instant>,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, app: A) -> Self {
        let source = WinitFrameSource::new(FrameClock::new());
        let scheduler = FrameScheduler::new(source.clone());

        Self {
            config,
            app,
            source,
            scheduler,
            canvas: Canvas::new(0, 0).into_shared(),
            live: None,
            started: false,
            next_poll: None,
            exit_requested: false,
            error: None,
        }
    }

    fn create_live(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Rc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let mut presenter = Presenter::new(&window)?;
        let size = window.inner_size();
        presenter.resize(size.width, size.height)?;
        self.canvas.borrow_mut().resize(size.width, size.height);

        self.source.attach(Rc::clone(&window));
        self.fit_pacer(&window);
        window.request_redraw();

        self.live = Some(Live {
            window,
            presenter,
            force_present: true,
        });
        Ok(())
    }

    /// Paces frames to the refresh rate of the monitor the window is on.
    fn fit_pacer(&self, window: &Window) {
        let millihertz = window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz());
        let pacer = FramePacer::from_millihertz(millihertz);
        log::debug!(
            "frame interval {:.3}ms ({})",
            pacer.interval().as_secs_f64() * 1_000.0,
            if millihertz.is_some() { "monitor" } else { "fallback" }
        );
        self.source.set_pacer(pacer);
    }

    fn start_app(&mut self) -> Result<()> {
        let Some(live) = self.live.as_ref() else {
            return Ok(());
        };

        let mut ctx = AppCtx::new(&self.scheduler, &self.canvas, &live.window);
        self.app.on_start(&mut ctx).context("application failed to start")?;
        self.started = true;

        self.next_poll = self.config.poll_interval.map(|i| Instant::now() + i);
        log::info!(
            "application started ({} frame callback(s) registered)",
            self.scheduler.callback_count()
        );
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            return;
        }
        self.exit_requested = true;

        if self.started {
            if let Some(live) = self.live.as_ref() {
                let mut ctx = AppCtx::new(&self.scheduler, &self.canvas, &live.window);
                self.app.on_shutdown(&mut ctx);
            }
        }

        self.scheduler.clear();
        self.source.detach();
        self.live = None;
        event_loop.exit();
    }

    fn deliver_input(&mut self, event_loop: &ActiveEventLoop, event: InputEvent) {
        if !self.started {
            return;
        }
        let Some(live) = self.live.as_ref() else {
            return;
        };

        let mut ctx = AppCtx::new(&self.scheduler, &self.canvas, &live.window);
        if self.app.on_input(event, &mut ctx) == AppControl::Exit {
            self.shutdown(event_loop);
        }
    }

    fn poll(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(interval), Some(due)) = (self.config.poll_interval, self.next_poll) else {
            return;
        };

        let now = Instant::now();
        if now < due {
            return;
        }
        self.next_poll = Some(now + interval);

        let Some(live) = self.live.as_ref() else {
            return;
        };

        let mut ctx = AppCtx::new(&self.scheduler, &self.canvas, &live.window);
        if self.app.on_poll(&mut ctx) == AppControl::Exit {
            self.shutdown(event_loop);
        }
    }

    fn redraw(&mut self) {
        if self.source.take_due(Instant::now()) {
            self.scheduler.dispatch_frame(self.source.now_ms());
        }

        let Some(live) = self.live.as_mut() else {
            return;
        };

        let mut canvas = self.canvas.borrow_mut();
        let dirty = canvas.take_dirty();
        if !(dirty || live.force_present) {
            return;
        }
        live.force_present = false;

        live.window.pre_present_notify();
        if let Err(e) = live.presenter.present(&canvas) {
            log::error!("{e:#}");
        }
    }

    fn resize(&mut self, event_loop: &ActiveEventLoop, width: u32, height: u32) {
        if let Some(live) = self.live.as_mut() {
            if let Err(e) = live.presenter.resize(width, height) {
                log::error!("{e:#}");
            }
            live.force_present = true;
            live.window.request_redraw();
        }
        self.canvas.borrow_mut().resize(width, height);

        self.deliver_input(event_loop, InputEvent::Resized { width, height });
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.live.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_live(event_loop) {
            self.fail(event_loop, e.context("failed to create initial window"));
            return;
        }

        if !self.started {
            if let Err(e) = self.start_app() {
                self.fail(event_loop, e);
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        // Surfaces are invalid while suspended; pending frames resume on re-attach.
        self.source.detach();
        self.live = None;
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        self.poll(event_loop);

        let next_frame = self.source.poll_frame(Instant::now());
        let wake = match (self.next_poll, next_frame) {
            (Some(poll), Some(frame)) => Some(poll.min(frame)),
            (poll, frame) => poll.or(frame),
        };

        match wake {
            Some(at) if !self.exit_requested => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(at));
            }
            _ => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => self.shutdown(event_loop),

            WindowEvent::Resized(size) => self.resize(event_loop, size.width, size.height),

            WindowEvent::ScaleFactorChanged { .. } => {
                // Usually means the window moved to another monitor.
                if let Some(window) = self.live.as_ref().map(|l| Rc::clone(&l.window)) {
                    self.fit_pacer(&window);
                    let size = window.inner_size();
                    self.resize(event_loop, size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            other => {
                if let Some(input) = translate_window_event(&other) {
                    self.deliver_input(event_loop, input);
                }
            }
        }
    }
}
