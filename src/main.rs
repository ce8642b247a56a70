use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::clock::SystemClock;
use crate::config::{Args, DisplayConfig};
use crate::display::RadarDisplay;
use crate::fade::FadeControl;
use crate::feed::{SectorFeed, SectorReceiver};
use crate::target::{RenderTarget, WindowTarget};
use crate::texture::CpuTextureFactory;

mod angle;
mod buffer;
mod clock;
mod compositor;
mod config;
mod diagnostics;
mod display;
mod error;
mod fade;
mod feed;
mod renderer;
mod scaler;
mod sector;
mod sweep_sim;
mod target;
mod texture;
mod viewport;

/// Fade adjustment per key press, seconds.
const FADE_STEP: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
enum UserEvent {
    SectorArrived,
}

struct App {
    target: Option<WindowTarget>,
    display: RadarDisplay<CpuTextureFactory, SystemClock>,
    sectors: SectorReceiver,
    controls: SectorFeed,
    running: Arc<AtomicBool>,

    redraw_period: Duration,
    next_redraw: Instant,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    failure: Option<anyhow::Error>,
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.target.is_some() {
            return;
        }
        match self.create_target(event_loop) {
            Ok(target) => {
                let (w, h) = target.size();
                self.display.resize(w, h);
                target.window().request_redraw();
                self.target = Some(target);
            }
            Err(e) => {
                log::error!("Could not open display window: {:#}", e);
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::SectorArrived => {
                if let Some(target) = &self.target {
                    target.window().request_redraw();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested; shutting down");
                self.shutdown(event_loop);
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),

            WindowEvent::RedrawRequested => {
                let Some(target) = self.target.as_mut() else {
                    return;
                };
                if target.window().id() != id {
                    return;
                }

                self.display.drain(&self.sectors);
                match self.display.draw_frame(target) {
                    Ok(stats) => log::trace!(
                        "drawn {} skipped {} faded {} evicted {} created {}",
                        stats.drawn,
                        stats.skipped,
                        stats.faded,
                        stats.evicted,
                        stats.created
                    ),
                    Err(e) => {
                        log::error!("Presenting frame failed: {}", e);
                        self.failure = Some(e.into());
                        self.shutdown(event_loop);
                        return;
                    }
                }

                // Print FPS
                self.frame_counter += 1;
                let now = Instant::now();
                if now.duration_since(self.last_fps_print).as_secs_f32() >= 1.0 {
                    let fps = self.frame_counter as f32
                        / now.duration_since(self.last_fps_print).as_secs_f32();
                    log::info!("FPS: {:.1}, {} sectors buffered", fps, self.display.len());
                    self.frame_counter = 0;
                    self.last_fps_print = now;
                }
            }

            WindowEvent::Resized(new_size) => {
                let (dw, dh) = (new_size.width as usize, new_size.height as usize);
                if let Some(target) = self.target.as_mut() {
                    if let Err(e) = target.resize(dw, dh) {
                        log::warn!("Surface resize to {}x{} failed: {}", dw, dh, e);
                    }
                }
                self.display.resize(dw, dh);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Periodic redraw keeps the fade moving without new data
        let now = Instant::now();
        if now >= self.next_redraw {
            if let Some(target) = &self.target {
                target.window().request_redraw();
            }
            self.next_redraw = now + self.redraw_period;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_redraw));
    }
}

impl App {
    fn new(
        config: &DisplayConfig,
        fade: FadeControl,
        sectors: SectorReceiver,
        controls: SectorFeed,
        running: Arc<AtomicBool>,
    ) -> Self {
        let display = RadarDisplay::new(
            config,
            fade,
            CpuTextureFactory::new(config.texel_budget),
            SystemClock,
        );
        Self {
            target: None,
            display,
            sectors,
            controls,
            running,
            redraw_period: config.redraw_period,
            next_redraw: Instant::now(),
            frame_counter: 0,
            last_fps_print: Instant::now(),
            failure: None,
        }
    }

    fn create_target(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<WindowTarget> {
        let attributes = Window::default_attributes()
            .with_title("PPI Sweep")
            .with_inner_size(LogicalSize::new(800.0, 800.0));
        let window = Rc::new(
            event_loop
                .create_window(attributes)
                .context("create window")?,
        );
        WindowTarget::new(window).context("create softbuffer surface")
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        let delta = match code {
            KeyCode::Equal | KeyCode::NumpadAdd | KeyCode::ArrowUp => FADE_STEP,
            KeyCode::Minus | KeyCode::NumpadSubtract | KeyCode::ArrowDown => -FADE_STEP,
            KeyCode::Space => {
                self.display.clear();
                return;
            }
            KeyCode::Escape => {
                self.shutdown(event_loop);
                return;
            }
            _ => return,
        };
        let next = (self.display.fade().get() + delta).max(FADE_STEP);
        if let Err(e) = self.controls.set_fade_duration(next) {
            log::warn!("Fade change rejected: {}", e);
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.running.store(false, Ordering::Relaxed);
        self.display.clear();
        event_loop.exit();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.display_config()?;
    log::info!(
        "Fade {:.2} s, eviction {:?}, convention {:?}",
        config.fade_secs,
        config.policy,
        config.convention
    );

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + config.redraw_period));

    let fade = FadeControl::new(config.fade_secs)?;
    let proxy = Mutex::new(event_loop.create_proxy());
    let (feed, sectors) = feed::channel(fade.clone(), move || {
        if let Ok(proxy) = proxy.lock() {
            // Fails only once the loop has exited
            let _ = proxy.send_event(UserEvent::SectorArrived);
        }
    });

    // Start synthetic sweep thread
    let running = Arc::new(AtomicBool::new(true));
    let producer_running = Arc::clone(&running);
    let sweep = args.sweep_config();
    let controls = feed.clone();
    let producer = thread::Builder::new()
        .name("sweep".into())
        .spawn(move || sweep_sim::run(sweep, feed, producer_running))
        .context("spawn sweep thread")?;

    let mut app = App::new(&config, fade, sectors, controls, Arc::clone(&running));
    let result = event_loop.run_app(&mut app);

    // Stop and wait for the producer
    running.store(false, Ordering::Relaxed);
    if producer.join().is_err() {
        log::error!("Sweep thread panicked");
    }

    result?;
    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
