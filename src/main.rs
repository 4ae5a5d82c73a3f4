//! Binaural Orb - binaural beat generator with an audio-reactive orb
//!
//! Two sine tones, one per ear, produce a perceived beat at their frequency
//! difference; a glowing wireframe orb pulses with the tones' spectrum.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use binaural_orb::audio::{AudioBackend, AudioSession};
use binaural_orb::cli::Args;
use binaural_orb::error::RenderError;
use binaural_orb::export::export_wav;
use binaural_orb::logging;
use binaural_orb::orb::OrbMesh;
use binaural_orb::params::*;
use binaural_orb::render_loop::RenderLoop;
use binaural_orb::rendering::GpuRenderer;
use binaural_orb::ui::{Key, Ui, UiCommand};

/// Main application state
struct App {
    args: Args,

    // Window and rendering
    window: Option<Arc<Window>>,
    frames: RenderLoop<GpuRenderer>,

    // Audio session of the open player screen
    session: Option<AudioSession>,
    audio_backend: AudioBackend,

    ui: Ui,
    shift_held: bool,

    // Configuration
    render_config: RenderConfig,
    bloom_config: BloomConfig,
    physics: OrbPhysics,

    // Time tracking
    start_time: Instant,

    /// Fatal error that ended the event loop
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(args: Args) -> Self {
        let render_config = args.render_config();
        let physics = OrbPhysics::default();
        let frames = RenderLoop::new(&render_config, physics.clone(), &BackdropConfig::default());

        Self {
            audio_backend: args.audio_backend(),
            args,
            window: None,
            frames,
            session: None,
            ui: Ui::new(ControlRanges::default()),
            shift_held: false,
            render_config,
            bloom_config: BloomConfig::default(),
            physics,
            start_time: Instant::now(),
            failure: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.ui.title(false))
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("creating window")?,
        );

        // Physical size can differ from the requested logical size
        let size = window.inner_size();
        self.frames.resize(size.width, size.height);

        let orb_mesh = OrbMesh::icosphere(self.physics.rest_radius, self.physics.detail);
        let renderer = pollster::block_on(GpuRenderer::new(
            Arc::clone(&window),
            &self.frames.layout(),
            &self.render_config,
            &self.bloom_config,
            &orb_mesh,
            self.frames.backdrop(),
        ))
        .context("initialising GPU renderer")?;

        self.frames.attach(renderer);
        self.window = Some(window);
        info!("Binaural Orb is running");
        Ok(())
    }

    /// Show the player for `rating` with a fresh audio session and orb
    fn open_player(&mut self, rating: u8, frequencies: Option<(f64, f64)>) {
        let ranges = self.ui.ranges().clone();
        let Some(label) = self.ui.enter_player(rating).map(|c| c.label()) else {
            return;
        };
        if let (Some((base, beat)), Some(controls)) = (frequencies, self.ui.player_mut()) {
            controls.set(base, beat, &ranges);
        }

        self.session = Some(AudioSession::new(
            self.audio_backend,
            SynthConfig::default(),
            AnalyserConfig::default(),
        ));
        self.frames.mount_orb();
        info!(rating, label, "player opened");
    }

    /// Leave the player: release audio and remove the orb together
    fn close_player(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
        self.frames.unmount_orb();
        self.ui.leave_player();
    }

    fn toggle_play(&mut self) {
        let (Some(session), Some(controls)) = (self.session.as_mut(), self.ui.player()) else {
            return;
        };
        if let Err(e) = session.toggle(controls.base_hz(), controls.beat_hz()) {
            warn!("Play rejected: {}", e);
        }
    }

    fn adjust(&mut self, command: UiCommand) {
        let ranges = self.ui.ranges().clone();
        let Some(controls) = self.ui.player_mut() else {
            return;
        };
        let changed = match command {
            UiCommand::AdjustBase(delta) => controls.adjust_base(delta, &ranges),
            UiCommand::AdjustBeat(delta) => controls.adjust_beat(delta, &ranges),
            _ => false,
        };
        if !changed {
            return;
        }

        let (base, beat) = (controls.base_hz(), controls.beat_hz());
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.update_frequencies(base, beat) {
                warn!("Retune rejected: {}", e);
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode, repeat: bool) {
        let Some(key) = key_from_code(code) else {
            return;
        };
        let Some(command) = self.ui.command_for_key(key, self.shift_held, repeat) else {
            return;
        };

        match command {
            UiCommand::SelectMood(rating) => self.open_player(rating, None),
            UiCommand::TogglePlay => self.toggle_play(),
            UiCommand::AdjustBase(_) | UiCommand::AdjustBeat(_) => self.adjust(command),
            UiCommand::Back => self.close_player(),
            UiCommand::Quit => event_loop.exit(),
        }
        self.update_title();
    }

    fn update_title(&self) {
        if let Some(window) = &self.window {
            let playing = self.session.as_ref().is_some_and(AudioSession::is_playing);
            window.set_title(&self.ui.title(playing));
        }
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let features = self.session.as_mut().and_then(AudioSession::sample_features);
        let time_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;

        match self.frames.frame(features.as_ref(), time_ms) {
            Ok(()) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                error!("GPU out of memory, exiting");
                self.fail(event_loop, anyhow::anyhow!("surface out of memory"));
            }
            Err(e) => error!("Render error: {}", e),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        self.failure = Some(e);
        event_loop.exit();
    }

    /// Release audio and rendering on every exit path
    fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
        self.frames.teardown();
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.init_window(event_loop) {
            self.fail(event_loop, e);
            return;
        }

        if let Some(rating) = self.args.start_rating() {
            let frequencies = self.args.frequencies();
            self.open_player(rating, Some(frequencies));
            if self.args.autoplay {
                self.toggle_play();
            }
        }
        self.update_title();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.frames.resize(size.width, size.height),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift_held = modifiers.state().shift_key();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code, repeat),
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn key_from_code(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Digit(1),
        KeyCode::Digit2 | KeyCode::Numpad2 => Key::Digit(2),
        KeyCode::Digit3 | KeyCode::Numpad3 => Key::Digit(3),
        KeyCode::Digit4 | KeyCode::Numpad4 => Key::Digit(4),
        KeyCode::Digit5 | KeyCode::Numpad5 => Key::Digit(5),
        KeyCode::Space => Key::Space,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    };
    Some(key)
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level);

    if let Some(path) = &args.export_wav {
        let (base, beat) = args.frequencies();
        let summary = export_wav(path, base, beat, args.seconds, &SynthConfig::default())
            .with_context(|| format!("exporting {}", path.display()))?;
        info!(
            frames = summary.frames,
            sample_rate_hz = summary.sample_rate_hz,
            "export complete"
        );
        return Ok(());
    }

    let event_loop = EventLoop::new().context("creating event loop")?;
    let mut app = App::new(args);
    event_loop.run_app(&mut app).context("running event loop")?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
