//! Stereo signal graph: two oscillators → merge → gain → limiter → output.
//!
//! The graph is shared between the audio callback (which pulls samples) and
//! the control side (which starts, stops and retunes voices). Every rendered
//! frame is also downmixed into a capture ring that feeds the analysis tap.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::tone::{Oscillator, TonePair};
use crate::params::SynthConfig;

/// Graph shared between the audio thread and the control thread
pub type SharedGraph = Arc<Mutex<SignalGraph>>;

/// Lock a shared graph, recovering from a poisoned mutex.
///
/// A panic on the audio thread must not take the UI down with it.
pub fn lock_graph(graph: &SharedGraph) -> MutexGuard<'_, SignalGraph> {
    graph.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One running left/right generator pair
#[derive(Debug, Clone)]
pub struct VoicePair {
    left: Oscillator,
    right: Oscillator,
    tones: TonePair,
    /// Graph frame at which both generators started
    start_frame: u64,
}

impl VoicePair {
    pub fn tones(&self) -> TonePair {
        self.tones
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    pub fn left(&self) -> &Oscillator {
        &self.left
    }

    pub fn right(&self) -> &Oscillator {
        &self.right
    }
}

/// Audio-producing graph
pub struct SignalGraph {
    sample_rate_hz: u32,
    gain: f32,
    limiter_ceiling: f32,
    voices: Option<VoicePair>,
    /// Frames rendered since the graph was created
    frame: u64,
    /// Most recent mono samples (post-gain) for the analysis tap
    capture: VecDeque<f32>,
    capture_len: usize,
}

impl SignalGraph {
    pub fn new(sample_rate_hz: u32, config: &SynthConfig, capture_len: usize) -> Self {
        Self {
            sample_rate_hz,
            gain: config.gain,
            limiter_ceiling: config.limiter_ceiling,
            voices: None,
            frame: 0,
            capture: VecDeque::with_capacity(capture_len),
            capture_len,
        }
    }

    pub fn shared(self) -> SharedGraph {
        Arc::new(Mutex::new(self))
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Current frame clock
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn voices(&self) -> Option<&VoicePair> {
        self.voices.as_ref()
    }

    /// Start a fresh generator pair, replacing any running one.
    ///
    /// Both generators share the same start frame. Returns that frame.
    pub fn start_voices(&mut self, tones: TonePair) -> u64 {
        self.voices = Some(VoicePair {
            left: Oscillator::new(tones.left),
            right: Oscillator::new(tones.right),
            tones,
            start_frame: self.frame,
        });
        self.frame
    }

    /// Halt the running pair. Returns false if nothing was running.
    pub fn stop_voices(&mut self) -> bool {
        self.voices.take().is_some()
    }

    /// Apply new frequencies to the running generators without restarting them.
    /// Returns false if nothing was running.
    pub fn retune(&mut self, tones: TonePair) -> bool {
        match self.voices.as_mut() {
            Some(voices) => {
                voices.left.set_frequency(tones.left.frequency_hz);
                voices.right.set_frequency(tones.right.frequency_hz);
                voices.tones = tones;
                true
            }
            None => false,
        }
    }

    /// Render interleaved frames into `out`.
    ///
    /// Channel 0 carries the left tone and channel 1 the right tone; extra
    /// channels are silent. A mono output receives the downmix.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        for frame in out.chunks_mut(channels) {
            let (left, right) = match self.voices.as_mut() {
                Some(voices) => (
                    voices.left.next_sample(self.sample_rate_hz),
                    voices.right.next_sample(self.sample_rate_hz),
                ),
                None => (0.0, 0.0),
            };

            // Safety limiter: hard clip to prevent ear damage
            let ceiling = self.limiter_ceiling;
            let left = (left * self.gain).clamp(-ceiling, ceiling);
            let right = (right * self.gain).clamp(-ceiling, ceiling);
            let mono = 0.5 * (left + right);

            match frame.len() {
                1 => frame[0] = mono,
                _ => {
                    frame[0] = left;
                    frame[1] = right;
                    frame[2..].fill(0.0);
                }
            }

            if self.capture_len > 0 {
                if self.capture.len() == self.capture_len {
                    self.capture.pop_front();
                }
                self.capture.push_back(mono);
            }
            self.frame += 1;
        }
    }

    /// Copy the most recent captured samples into `out`, oldest first.
    ///
    /// When fewer samples have been captured than `out` holds, the front is
    /// zero-filled (the tap hears silence before the graph started).
    pub fn copy_recent(&self, out: &mut [f32]) {
        let available = self.capture.len().min(out.len());
        let pad = out.len() - available;
        out[..pad].fill(0.0);

        let skip = self.capture.len() - available;
        for (dst, src) in out[pad..].iter_mut().zip(self.capture.iter().skip(skip)) {
            *dst = *src;
        }
    }
}
