//! Binaural tone synthesis and spectral analysis.
//!
//! Two sine generators feed a stereo graph whose downmix is tapped by a
//! windowed FFT analyser for audio-reactive visuals.

mod analyser;
mod graph;
mod session;
mod tone;

// Re-export public types
pub use analyser::{blackman_window, AnalysisTap};
pub use graph::{lock_graph, SharedGraph, SignalGraph, VoicePair};
pub use session::{AudioBackend, AudioSession, SessionState};
pub use tone::{Oscillator, ToneDescriptor, TonePair, Waveform};
