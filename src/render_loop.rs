//! Per-frame controller: deform, rotate, and hand the frame to the renderer.
//!
//! The loop is driven from outside (the window's redraw cycle). It owns the
//! camera, the backdrop, the optional reactive orb, and the renderer, and
//! tears them down together.

use tracing::{debug, info};

use crate::camera::CameraSystem;
use crate::error::RenderError;
use crate::features::SpectralFeatures;
use crate::orb::{BackdropOrb, OrbSystem};
use crate::params::{BackdropConfig, OrbPhysics, RenderConfig};
use crate::rendering::{CompositeLayout, FrameInput, FrameRenderer, OrbDraw};

/// Frames per second, reported once per window
struct FpsCounter {
    frames: u32,
    window_start_ms: Option<f64>,
}

impl FpsCounter {
    const WINDOW_MS: f64 = 1000.0;

    fn new() -> Self {
        Self {
            frames: 0,
            window_start_ms: None,
        }
    }

    /// Count a frame; returns the average rate when a window closes
    fn tick(&mut self, time_ms: f64) -> Option<f64> {
        let start = *self.window_start_ms.get_or_insert(time_ms);
        self.frames += 1;

        let elapsed = time_ms - start;
        if elapsed < Self::WINDOW_MS {
            return None;
        }

        let fps = self.frames as f64 * 1000.0 / elapsed;
        self.frames = 0;
        self.window_start_ms = Some(time_ms);
        Some(fps)
    }
}

pub struct RenderLoop<R: FrameRenderer> {
    camera: CameraSystem,
    physics: OrbPhysics,
    orb: Option<OrbSystem>,
    backdrop: BackdropOrb,
    renderer: Option<R>,
    layout: CompositeLayout,
    running: bool,
    fps: FpsCounter,
}

impl<R: FrameRenderer> RenderLoop<R> {
    pub fn new(render: &RenderConfig, physics: OrbPhysics, backdrop: &BackdropConfig) -> Self {
        Self {
            camera: CameraSystem::new(render),
            physics,
            orb: None,
            backdrop: BackdropOrb::new(backdrop),
            renderer: None,
            layout: CompositeLayout::new(render.window_width, render.window_height),
            running: false,
            fps: FpsCounter::new(),
        }
    }

    /// Attach the output surface and start scheduling frames
    pub fn attach(&mut self, renderer: R) {
        self.renderer = Some(renderer);
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    pub fn camera(&self) -> &CameraSystem {
        &self.camera
    }

    pub fn layout(&self) -> CompositeLayout {
        self.layout
    }

    pub fn backdrop(&self) -> &BackdropOrb {
        &self.backdrop
    }

    pub fn orb(&self) -> Option<&OrbSystem> {
        self.orb.as_ref()
    }

    /// Show a fresh reactive orb (new mesh, new rest snapshot)
    pub fn mount_orb(&mut self) {
        if self.orb.is_none() {
            self.orb = Some(OrbSystem::new(&self.physics));
        }
    }

    pub fn unmount_orb(&mut self) {
        self.orb = None;
    }

    /// Follow a viewport size change. Zero-sized viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.camera.resize(width, height) {
            return;
        }
        self.layout = CompositeLayout::new(width, height);
        debug!(width, height, aspect = self.camera.aspect(), "viewport resized");

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(&self.layout);
        }
    }

    /// Run one frame: deform the orb with `features` (when audio is
    /// active), rotate both orbs, and render.
    pub fn frame(
        &mut self,
        features: Option<&SpectralFeatures>,
        time_ms: f64,
    ) -> Result<(), RenderError> {
        if !self.running {
            return Ok(());
        }

        if let Some(orb) = self.orb.as_mut() {
            orb.update(features, time_ms);
        }
        self.backdrop.update();

        if let Some(fps) = self.fps.tick(time_ms) {
            debug!("{fps:.1} fps");
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };

        let orb = self.orb.as_mut().map(|orb| {
            let dirty = orb.mesh.take_dirty();
            OrbDraw {
                model: orb.model_matrix(),
                vertices: dirty.then_some(&orb.mesh.vertices[..]),
            }
        });

        let input = FrameInput {
            view_proj: self.camera.view_proj(),
            orb,
            backdrop_model: self.backdrop.model_matrix(),
        };
        renderer.render(&input)
    }

    /// Stop scheduling frames and release the renderer. Safe to call
    /// repeatedly and before anything was attached.
    pub fn teardown(&mut self) {
        if !self.running && self.renderer.is_none() {
            return;
        }
        self.running = false;
        self.orb = None;
        if self.renderer.take().is_some() {
            info!("render loop stopped, surface released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records what the loop asks of it
    #[derive(Default)]
    struct RecordingRenderer {
        layouts: Vec<CompositeLayout>,
        frames: usize,
        uploads: usize,
        orb_frames: usize,
    }

    impl FrameRenderer for RecordingRenderer {
        fn resize(&mut self, layout: &CompositeLayout) {
            self.layouts.push(*layout);
        }

        fn render(&mut self, frame: &FrameInput<'_>) -> Result<(), RenderError> {
            self.frames += 1;
            if let Some(orb) = &frame.orb {
                self.orb_frames += 1;
                if orb.vertices.is_some() {
                    self.uploads += 1;
                }
            }
            Ok(())
        }
    }

    fn render_loop() -> RenderLoop<RecordingRenderer> {
        let config = RenderConfig {
            window_width: 800,
            window_height: 600,
            ..Default::default()
        };
        RenderLoop::new(&config, OrbPhysics::default(), &BackdropConfig::default())
    }

    fn loud() -> SpectralFeatures {
        SpectralFeatures {
            lower_max_fr: 1.0,
            upper_avg_fr: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_resize_updates_camera_and_targets() {
        let mut frames = render_loop();
        frames.attach(RecordingRenderer::default());
        frames.resize(1200, 800);

        assert!((frames.camera().aspect() - 1.5).abs() < 1e-6);
        let recorded = &frames.renderer().map(|r| r.layouts.clone()).unwrap_or_default();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].surface, (1200, 800));
        assert_eq!(recorded[0].bloom, (600, 400));
    }

    #[test]
    fn test_zero_resize_ignored() {
        let mut frames = render_loop();
        frames.attach(RecordingRenderer::default());
        frames.resize(0, 0);

        assert_eq!(frames.layout().surface, (800, 600));
        assert!(frames.renderer().is_some_and(|r| r.layouts.is_empty()));
    }

    #[test]
    fn test_frames_upload_only_when_deformed() {
        let mut frames = render_loop();
        frames.attach(RecordingRenderer::default());
        frames.mount_orb();

        frames.frame(None, 0.0).unwrap(); // initial mesh upload
        frames.frame(None, 16.0).unwrap();
        frames.frame(Some(&loud()), 32.0).unwrap();
        frames.frame(Some(&loud()), 48.0).unwrap();

        let renderer = frames.renderer().unwrap();
        assert_eq!(renderer.frames, 4);
        assert_eq!(renderer.orb_frames, 4);
        assert_eq!(renderer.uploads, 3);
    }

    #[test]
    fn test_unmounted_orb_still_draws_backdrop() {
        let mut frames = render_loop();
        frames.attach(RecordingRenderer::default());

        frames.frame(Some(&loud()), 0.0).unwrap();
        frames.frame(None, 16.0).unwrap();

        let renderer = frames.renderer().unwrap();
        assert_eq!(renderer.frames, 2);
        assert_eq!(renderer.orb_frames, 0);
        assert!(frames.backdrop().rotation().x > 0.0);
    }

    #[test]
    fn test_remount_gives_fresh_orb() {
        let mut frames = render_loop();
        frames.attach(RecordingRenderer::default());
        frames.mount_orb();
        frames.frame(Some(&loud()), 10.0).unwrap();
        assert!(frames.orb().is_some_and(|o| o.deformer().rest_positions().is_some()));

        frames.unmount_orb();
        assert!(frames.orb().is_none());
        frames.mount_orb();
        assert!(frames.orb().is_some_and(|o| o.deformer().rest_positions().is_none()));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut frames = render_loop();

        // Nothing attached yet
        frames.teardown();
        assert!(!frames.is_running());

        frames.attach(RecordingRenderer::default());
        frames.mount_orb();
        assert!(frames.is_running());

        frames.teardown();
        frames.teardown();
        assert!(!frames.is_running());
        assert!(frames.renderer().is_none());
        assert!(frames.orb().is_none());

        // Frames after teardown do nothing
        frames.frame(Some(&loud()), 100.0).unwrap();
        assert!(frames.backdrop().rotation().x.abs() < f32::EPSILON);
    }

    #[test]
    fn test_fps_counter_reports_each_second() {
        let mut fps = FpsCounter::new();
        let mut reports = Vec::new();
        for frame in 0..=120 {
            if let Some(rate) = fps.tick(frame as f64 * 1000.0 / 60.0) {
                reports.push(rate);
            }
        }
        assert_eq!(reports.len(), 2);
        assert!((reports[0] - 61.0).abs() < 1.0);
    }
}
