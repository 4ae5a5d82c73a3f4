//! End-to-end runs of session → analyser → features → orb → render loop,
//! on the offline audio backend and a recording renderer (no device, no GPU).

use glam::Vec3;

use binaural_orb::audio::{AudioBackend, AudioSession, SessionState};
use binaural_orb::error::RenderError;
use binaural_orb::features::SpectralFeatures;
use binaural_orb::orb::{DeformState, OrbSystem};
use binaural_orb::params::{AnalyserConfig, BackdropConfig, OrbPhysics, RenderConfig, SynthConfig};
use binaural_orb::render_loop::RenderLoop;
use binaural_orb::rendering::{CompositeLayout, FrameInput, FrameRenderer};

#[derive(Default)]
struct CountingRenderer {
    frames: usize,
    resizes: Vec<CompositeLayout>,
}

impl FrameRenderer for CountingRenderer {
    fn resize(&mut self, layout: &CompositeLayout) {
        self.resizes.push(*layout);
    }

    fn render(&mut self, _frame: &FrameInput<'_>) -> Result<(), RenderError> {
        self.frames += 1;
        Ok(())
    }
}

fn offline_session() -> AudioSession {
    AudioSession::new(
        AudioBackend::Offline,
        SynthConfig::default(),
        AnalyserConfig::default(),
    )
}

/// Pull `frames` stereo frames through the offline graph
fn pump(session: &AudioSession, frames: usize) {
    let mut buffer = vec![0.0f32; frames * 2];
    session.render_into(&mut buffer, 2);
}

fn positions(orb: &OrbSystem) -> Vec<Vec3> {
    orb.mesh
        .vertices
        .iter()
        .map(|v| Vec3::from_array(v.position))
        .collect()
}

#[test]
fn playing_tones_deform_the_orb() {
    let mut session = offline_session();
    session.play(221.23, 7.83).unwrap();
    pump(&session, 2048);

    let features = session.sample_features().unwrap();
    // Both tones sit in the lowest bins
    assert!(features.lower_max > features.upper_max);
    assert!(features.lower_max_fr > 1.0);

    let mut orb = OrbSystem::new(&OrbPhysics::default());
    orb.update(Some(&features), 1_000.0);
    assert_eq!(orb.deform_state(), DeformState::Deforming);

    let rest = orb.deformer().rest_positions().unwrap().to_vec();
    let lowest = 2.0 + features.lower_max_fr - 0.5 * features.upper_avg_fr * 1.5;
    for (live, rest) in positions(&orb).iter().zip(&rest) {
        assert!(live.cross(*rest).length() < 1e-3);
        assert!(live.dot(*rest) > 0.0);
        assert!(live.length() >= lowest);
    }
}

#[test]
fn stopping_freezes_the_last_shape() {
    let mut session = offline_session();
    let mut orb = OrbSystem::new(&OrbPhysics::default());

    session.play(136.1, 13.0).unwrap();
    pump(&session, 1024);
    let features = session.sample_features();
    assert!(features.is_some());
    orb.update(features.as_ref(), 16.0);
    let deformed = positions(&orb);

    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    let features = session.sample_features();
    assert!(features.is_none());

    orb.update(features.as_ref(), 32.0);
    assert_eq!(positions(&orb), deformed);
}

#[test]
fn retuning_keeps_generators_running() {
    let mut session = offline_session();
    session.play(141.27, 15.0).unwrap();
    let start = session.start_frame();
    pump(&session, 4096);

    session.update_frequencies(136.1, 13.0).unwrap();
    let pair = session.tone_pair().unwrap();
    assert!((pair.left.frequency_hz - 129.6).abs() < 1e-9);
    assert!((pair.right.frequency_hz - 142.6).abs() < 1e-9);
    assert_eq!(session.start_frame(), start);
    assert!(session.is_playing());
}

#[test]
fn unsupported_audio_leaves_orb_at_rest() {
    let mut session = AudioSession::new(
        AudioBackend::Disabled,
        SynthConfig::default(),
        AnalyserConfig::default(),
    );
    session.play(194.18, 4.0).unwrap();
    assert_eq!(session.state(), SessionState::Uninitialized);

    let mut frames: RenderLoop<CountingRenderer> = RenderLoop::new(
        &RenderConfig::default(),
        OrbPhysics::default(),
        &BackdropConfig::default(),
    );
    frames.attach(CountingRenderer::default());
    frames.mount_orb();

    for frame in 0..10 {
        let features = session.sample_features();
        frames.frame(features.as_ref(), frame as f64 * 16.0).unwrap();
    }

    let orb = frames.orb().unwrap();
    assert_eq!(orb.deform_state(), DeformState::Resting);
    for live in positions(orb) {
        assert!((live.length() - 2.0).abs() < 1e-5);
    }
    assert_eq!(frames.renderer().map(|r| r.frames), Some(10));
}

#[test]
fn full_session_lifecycle_with_render_loop() {
    let mut session = offline_session();
    let mut frames: RenderLoop<CountingRenderer> = RenderLoop::new(
        &RenderConfig {
            window_width: 800,
            window_height: 600,
            ..Default::default()
        },
        OrbPhysics::default(),
        &BackdropConfig::default(),
    );
    frames.attach(CountingRenderer::default());
    frames.mount_orb();

    session.play(126.22, 10.0).unwrap();
    for frame in 0..30 {
        pump(&session, 735); // one 60 Hz frame of audio at 44.1 kHz
        let features: Option<SpectralFeatures> = session.sample_features();
        frames.frame(features.as_ref(), frame as f64 * 1000.0 / 60.0).unwrap();
    }

    frames.resize(1200, 800);
    assert!((frames.camera().aspect() - 1.5).abs() < 1e-6);
    let renderer = frames.renderer().unwrap();
    assert_eq!(renderer.frames, 30);
    assert_eq!(renderer.resizes.last().map(|l| l.bloom), Some((600, 400)));

    // Leaving releases audio and rendering together
    session.teardown();
    frames.teardown();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!frames.is_running());

    // Second teardown is a no-op on both
    session.teardown();
    frames.teardown();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.sample_features().is_none());
}
