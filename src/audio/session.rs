//! Audio session: lifecycle of the synthesis graph and its analysis tap.
//!
//! The processing context (graph + output stream + tap) is created lazily on
//! the first play request and released exactly once by [`AudioSession::teardown`].
//! A host without audio support leaves the session `Uninitialized`; every
//! later request is a silent no-op.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::analyser::AnalysisTap;
use super::graph::{lock_graph, SharedGraph, SignalGraph};
use super::tone::TonePair;
use crate::error::AudioError;
use crate::features::SpectralFeatures;
use crate::params::{AnalyserConfig, SynthConfig};

/// Where the graph's samples go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBackend {
    /// Default output device of the default host
    Device,
    /// No device; the owner pulls samples with [`AudioSession::render_into`]
    Offline,
    /// Audio explicitly unavailable (behaves like an unsupported host)
    Disabled,
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Idle,
    Playing,
    Stopped,
    Closed,
}

/// Processing context created on first use
struct AudioContext {
    graph: SharedGraph,
    tap: AnalysisTap,
    /// Output stream (kept alive); None when running offline
    stream: Option<cpal::Stream>,
}

/// Binaural tone session
pub struct AudioSession {
    synth: SynthConfig,
    analyser: AnalyserConfig,
    backend: AudioBackend,
    state: SessionState,
    context: Option<AudioContext>,
    /// Set once when the host turned out to lack audio support
    init_failed: bool,
}

impl AudioSession {
    pub fn new(backend: AudioBackend, synth: SynthConfig, analyser: AnalyserConfig) -> Self {
        Self {
            synth,
            analyser,
            backend,
            state: SessionState::Uninitialized,
            context: None,
            init_failed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    /// Lazily create the processing context and analysis tap.
    ///
    /// Idempotent. A failure is logged once and leaves the session
    /// `Uninitialized` for good.
    pub fn initialize(&mut self) {
        if self.context.is_some() || self.init_failed || self.state == SessionState::Closed {
            return;
        }

        match self.open_context() {
            Ok(context) => {
                self.context = Some(context);
                self.state = SessionState::Idle;
            }
            Err(e) => {
                warn!("Audio unavailable, continuing without sound: {}", e);
                self.init_failed = true;
            }
        }
    }

    fn open_context(&self) -> Result<AudioContext, AudioError> {
        let tap = AnalysisTap::new(self.analyser.clone())?;
        let capture_len = self.analyser.fft_size;

        let (graph, stream) = match self.backend {
            AudioBackend::Device => {
                let (graph, stream) = open_device_stream(&self.synth, capture_len)?;
                (graph, Some(stream))
            }
            AudioBackend::Offline => {
                let graph = SignalGraph::new(
                    self.synth.offline_sample_rate_hz,
                    &self.synth,
                    capture_len,
                );
                (graph.shared(), None)
            }
            AudioBackend::Disabled => {
                return Err(AudioError::Unsupported("audio disabled".to_string()))
            }
        };

        Ok(AudioContext { graph, tap, stream })
    }

    /// Start a tone pair for `(base, beat)`, replacing any running pair.
    ///
    /// Invalid frequencies are rejected without touching the session. On a
    /// host without audio this is a no-op.
    pub fn play(&mut self, base_hz: f64, beat_hz: f64) -> Result<(), AudioError> {
        let tones = TonePair::derive(base_hz, beat_hz)?;

        self.initialize();
        let Some(context) = self.context.as_ref() else {
            debug!("Play ignored: no audio context");
            return Ok(());
        };

        let mut graph = lock_graph(&context.graph);
        if graph.stop_voices() {
            debug!("Replacing running tone pair");
        }
        let start_frame = graph.start_voices(tones);
        drop(graph);

        self.state = SessionState::Playing;
        info!(
            left_hz = tones.left.frequency_hz,
            right_hz = tones.right.frequency_hz,
            start_frame,
            "Playing binaural tones"
        );
        Ok(())
    }

    /// Halt the running tones. Safe to call repeatedly.
    ///
    /// An initialized session always ends up `Stopped`, even if nothing was
    /// playing; an uninitialized or closed one keeps its state.
    pub fn stop(&mut self) {
        if let Some(context) = self.context.as_ref() {
            if lock_graph(&context.graph).stop_voices() {
                info!("Tones stopped");
            }
        }
        if matches!(self.state, SessionState::Playing | SessionState::Idle) {
            self.state = SessionState::Stopped;
        }
    }

    /// Play if stopped, stop if playing
    pub fn toggle(&mut self, base_hz: f64, beat_hz: f64) -> Result<(), AudioError> {
        if self.is_playing() {
            self.stop();
            Ok(())
        } else {
            self.play(base_hz, beat_hz)
        }
    }

    /// Retune the running generators in place (no restart, phase preserved).
    ///
    /// Does nothing while not playing.
    pub fn update_frequencies(&mut self, base_hz: f64, beat_hz: f64) -> Result<(), AudioError> {
        if !self.is_playing() {
            return Ok(());
        }
        let tones = TonePair::derive(base_hz, beat_hz)?;

        if let Some(context) = self.context.as_ref() {
            if lock_graph(&context.graph).retune(tones) {
                debug!(
                    left_hz = tones.left.frequency_hz,
                    right_hz = tones.right.frequency_hz,
                    "Retuned tones"
                );
            }
        }
        Ok(())
    }

    /// Stop tones and release the processing context. Runs once; later calls are no-ops.
    pub fn teardown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        self.stop();
        if let Some(context) = self.context.take() {
            if let Some(stream) = context.stream {
                if let Err(e) = stream.pause() {
                    debug!("Pausing stream during teardown failed: {}", e);
                }
            }
            info!("Audio context released");
        }
        self.state = SessionState::Closed;
    }

    /// Frequencies of the running pair, if any
    pub fn tone_pair(&self) -> Option<TonePair> {
        let context = self.context.as_ref()?;
        let graph = lock_graph(&context.graph);
        graph.voices().map(|v| v.tones())
    }

    /// Graph frame at which the running pair started
    pub fn start_frame(&self) -> Option<u64> {
        let context = self.context.as_ref()?;
        let graph = lock_graph(&context.graph);
        graph.voices().map(|v| v.start_frame())
    }

    pub fn sample_rate_hz(&self) -> Option<u32> {
        let context = self.context.as_ref()?;
        let rate = lock_graph(&context.graph).sample_rate_hz();
        Some(rate)
    }

    /// Pull interleaved samples from the graph.
    ///
    /// Meant for the offline backend; a device stream pulls on its own.
    pub fn render_into(&self, out: &mut [f32], channels: usize) {
        match self.context.as_ref() {
            Some(context) => lock_graph(&context.graph).render(out, channels),
            None => out.fill(0.0),
        }
    }

    /// Take a fresh spectral snapshot from the analysis tap
    pub fn sample_spectrum(&mut self) -> Option<&[u8]> {
        let context = self.context.as_mut()?;
        lock_graph(&context.graph).copy_recent(context.tap.time_domain_mut());
        Some(context.tap.analyse())
    }

    /// Spectral features for this frame, or None while not playing
    pub fn sample_features(&mut self) -> Option<SpectralFeatures> {
        if !self.is_playing() {
            return None;
        }
        self.sample_spectrum().map(SpectralFeatures::from_bins)
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Open the default output device and start a stream driven by a new graph
fn open_device_stream(
    synth: &SynthConfig,
    capture_len: usize,
) -> Result<(SharedGraph, cpal::Stream), AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoOutputDevice)?;

    let supported = device.default_output_config()?;
    let sample_rate_hz = supported.sample_rate().0;
    let channels = supported.channels() as usize;

    info!(
        device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
        sample_rate_hz,
        channels,
        "Audio output opened"
    );

    let graph = SignalGraph::new(sample_rate_hz, synth, capture_len).shared();
    let config: cpal::StreamConfig = supported.config();

    let stream = match supported.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, channels, Arc::clone(&graph))?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, channels, Arc::clone(&graph))?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, channels, Arc::clone(&graph))?,
        other => return Err(AudioError::UnsupportedSampleFormat(other)),
    };

    stream.play()?;

    Ok((graph, stream))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    graph: SharedGraph,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            lock_graph(&graph).render(&mut scratch, channels);

            for (out, &sample) in data.iter_mut().zip(&scratch) {
                *out = T::from_sample(sample);
            }
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )?;

    Ok(stream)
}
