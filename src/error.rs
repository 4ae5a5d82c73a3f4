//! Error types for audio and rendering.

use thiserror::Error;

/// Audio subsystem errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// Host has no usable audio backend (session degrades to silent mode)
    #[error("audio unsupported: {0}")]
    Unsupported(String),

    #[error("no audio output device found")]
    NoOutputDevice,

    #[error("failed to query output config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported output sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    /// Tone pair would be non-physical (negative beat, left channel at or below 0 Hz)
    #[error("invalid tone pair (base {base_hz} Hz, beat {beat_hz} Hz): {reason}")]
    InvalidTone {
        base_hz: f64,
        beat_hz: f64,
        reason: &'static str,
    },

    #[error("invalid audio config: {0}")]
    InvalidConfig(String),

    #[error("WAV export failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
