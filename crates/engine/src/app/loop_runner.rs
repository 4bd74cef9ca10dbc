use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::{resolve_app_paths, StartupError};

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::scene::SceneMachine;
use super::{
    AudioCommand, AudioBus, InputAction, InputSnapshot, OverlayData, Renderer, Scene,
    SceneCommand, Vec2, Viewport,
};

pub const SLOW_FRAME_ENV_VAR: &str = "PLATFORMER_SLOW_FRAME_MS";

const FALLBACK_FRAME_DELTA: Duration = Duration::from_millis(250);
const FALLBACK_METRICS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    /// Size of the logical frame buffer; the window is this times `pixel_scale`.
    pub logical_width: u32,
    pub logical_height: u32,
    pub pixel_scale: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Platformer".to_string(),
            logical_width: 256,
            logical_height: 244,
            pixel_scale: 3,
            target_tps: 60,
            max_frame_delta: FALLBACK_FRAME_DELTA,
            max_ticks_per_frame: 5,
            metrics_log_interval: FALLBACK_METRICS_INTERVAL,
            simulated_slow_frame_ms: 0,
            max_render_fps: Some(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        "startup"
    );

    let logical = Viewport {
        width: config.logical_width.max(1),
        height: config.logical_height.max(1),
    };
    let pixel_scale = config.pixel_scale.max(1);
    let pacing = FramePacing::from_config(&config, resolve_slow_frame_delay(&config));
    let mut scenes = SceneMachine::new(
        scene,
        Vec2::new(logical.width as f32, logical.height as f32),
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                (logical.width * pixel_scale) as f64,
                (logical.height * pixel_scale) as f64,
            ))
            .with_min_inner_size(LogicalSize::new(logical.width as f64, logical.height as f64))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), logical, app_paths.assets_dir.clone())
        .map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    scenes.load();
    scenes.apply_pending();
    info!(entity_count = scenes.world().entity_count(), "scene_loaded");
    info!(
        tick_ms = pacing.fixed_dt.as_secs_f64() * 1000.0,
        logical_width = logical.width,
        logical_height = logical.height,
        pixel_scale,
        max_frame_delta_ms = pacing.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = pacing.max_ticks_per_frame,
        slow_frame_delay_ms = pacing.slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(pacing.render_fps_cap),
        "loop_config"
    );

    let mut input = InputCollector::default();
    let mut metrics = MetricsAccumulator::new(normalize_non_zero(
        config.metrics_log_interval,
        FALLBACK_METRICS_INTERVAL,
    ));
    let mut accumulator = Duration::ZERO;
    let mut last_frame = Instant::now();
    let mut last_present = Instant::now();
    let mut applied_title: Option<String> = None;
    let mut overlay_visible = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(size) => {
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_keyboard_input(&event);
                    if input.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if input.overlay_toggle.take() {
                        overlay_visible = !overlay_visible;
                        info!(overlay_visible, "overlay_toggled");
                    }
                    if !pacing.slow_frame_delay.is_zero() {
                        thread::sleep(pacing.slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame);
                    last_frame = now;
                    accumulator = accumulator.saturating_add(pacing.clamp_frame_delta(raw_frame_dt));

                    let plan = pacing.plan(accumulator);
                    for _ in 0..plan.ticks {
                        let snapshot = input.snapshot_for_tick();
                        if scenes.update(pacing.fixed_dt, &snapshot) == SceneCommand::Restart {
                            scenes.apply_pending();
                            scenes.restart();
                            info!(
                                restart_count = scenes.restart_count(),
                                entity_count = scenes.world().entity_count(),
                                "scene_restarted"
                            );
                        }
                        scenes.apply_pending();
                        metrics.record_tick();
                    }
                    accumulator = plan.carry;
                    if !plan.dropped.is_zero() {
                        metrics.record_clamp();
                        warn!(
                            dropped_backlog_ms = plan.dropped.as_millis() as u64,
                            max_ticks_per_frame = pacing.max_ticks_per_frame,
                            "sim_clamp_triggered"
                        );
                    }
                    flush_audio(scenes.world_mut().audio_mut());

                    let cap_sleep =
                        pacing.cap_sleep(Instant::now().saturating_duration_since(last_present));
                    if !cap_sleep.is_zero() {
                        thread::sleep(cap_sleep);
                    }

                    let overlay = overlay_visible.then(|| OverlayData {
                        metrics: metrics.latest(),
                        render_fps_cap: pacing.render_fps_cap,
                        slow_frame_delay_ms: pacing.slow_frame_delay.as_millis() as u64,
                        entity_count: scenes.world().entity_count(),
                        restart_count: scenes.restart_count(),
                        scene_lines: scenes.debug_lines(),
                    });
                    if let Err(error) = renderer.render_world(scenes.world(), overlay.as_ref()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present = Instant::now();

                    let title = scenes.debug_title();
                    if title != applied_title {
                        window.set_title(title.as_deref().unwrap_or(&config.window_title));
                        applied_title = title;
                    }

                    metrics.record_frame(raw_frame_dt);
                    if let Some(snapshot) = metrics.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            worst_frame_ms = snapshot.worst_frame_ms,
                            clamped_frames = snapshot.clamped_frames,
                            entity_count = scenes.world().entity_count(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                scenes.shutdown();
                flush_audio(scenes.world_mut().audio_mut());
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// There is no mixer; cues are reported and dropped.
fn flush_audio(bus: &mut AudioBus) {
    for command in bus.drain() {
        match command {
            AudioCommand::Play {
                handle,
                cue,
                options,
            } => debug!(
                handle = handle.raw(),
                cue,
                volume = options.volume,
                looped = options.looped,
                "audio_play"
            ),
            AudioCommand::Stop { handle } => debug!(handle = handle.raw(), "audio_stop"),
        }
    }
}

/// Fixed-step and presentation timing derived once from `LoopConfig`.
#[derive(Debug, Clone, Copy)]
struct FramePacing {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    render_fps_cap: Option<u32>,
    slow_frame_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks: u32,
    /// Partial tick carried into the next frame.
    carry: Duration,
    /// Whole ticks discarded because the frame hit its tick budget.
    dropped: Duration,
}

impl FramePacing {
    fn from_config(config: &LoopConfig, slow_frame_delay: Duration) -> Self {
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / config.target_tps.max(1) as f64),
            max_frame_delta: normalize_non_zero(config.max_frame_delta, FALLBACK_FRAME_DELTA),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            render_fps_cap: config.max_render_fps.filter(|fps| *fps > 0),
            slow_frame_delay,
        }
    }

    fn clamp_frame_delta(&self, frame_dt: Duration) -> Duration {
        frame_dt.min(self.max_frame_delta)
    }

    fn plan(&self, accumulator: Duration) -> StepPlan {
        let due = (accumulator.as_nanos() / self.fixed_dt.as_nanos().max(1)) as u64;
        let ticks = due.min(self.max_ticks_per_frame as u64) as u32;
        let consumed = self.fixed_dt.saturating_mul(ticks);
        let leftover = accumulator.saturating_sub(consumed);
        if leftover >= self.fixed_dt {
            StepPlan {
                ticks,
                carry: Duration::ZERO,
                dropped: leftover,
            }
        } else {
            StepPlan {
                ticks,
                carry: leftover,
                dropped: Duration::ZERO,
            }
        }
    }

    fn cap_sleep(&self, since_last_present: Duration) -> Duration {
        let Some(fps) = self.render_fps_cap else {
            return Duration::ZERO;
        };
        Duration::from_secs_f64(1.0 / fps as f64).saturating_sub(since_last_present)
    }
}

/// A key that reports a single press until it is released again.
#[derive(Debug, Default)]
struct EdgeKey {
    held: bool,
    pressed: bool,
}

impl EdgeKey {
    fn update(&mut self, state: ElementState) {
        let down = state == ElementState::Pressed;
        if down && !self.held {
            self.pressed = true;
        }
        self.held = down;
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.pressed)
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    overlay_toggle: EdgeKey,
    state_dump: EdgeKey,
    actions: ActionStates,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return;
        };
        match code {
            KeyCode::F3 => self.overlay_toggle.update(key_event.state),
            KeyCode::F9 => self.state_dump.update(key_event.state),
            _ => self.set_key(code, key_event.state == ElementState::Pressed),
        }
    }

    fn set_key(&mut self, code: KeyCode, is_pressed: bool) {
        let action = match code {
            KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
            KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
            KeyCode::KeyW | KeyCode::ArrowUp | KeyCode::Space => InputAction::Jump,
            KeyCode::Escape => {
                self.quit_requested |= is_pressed;
                InputAction::Quit
            }
            _ => return,
        };
        self.actions.set(action, is_pressed);
    }

    /// The state-dump edge is consumed by the first tick that sees it.
    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        InputSnapshot::new(self.quit_requested, self.state_dump.take(), self.actions)
    }
}

fn normalize_non_zero(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    cap.map_or_else(|| "off".to_string(), |fps| fps.to_string())
}

fn resolve_slow_frame_delay(config: &LoopConfig) -> Duration {
    let fallback = Duration::from_millis(config.simulated_slow_frame_ms);
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => parse_slow_frame_ms(&value).unwrap_or_else(|| {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                value = value.as_str(),
                "slow_frame_env_invalid"
            );
            fallback
        }),
        Err(env::VarError::NotPresent) => fallback,
        Err(err) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, error = %err, "slow_frame_env_unreadable");
            fallback
        }
    }
}

fn parse_slow_frame_ms(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_millis)
}
