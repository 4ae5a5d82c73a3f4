//! Tone pair derivation and phase-accumulating sine oscillators.

use std::f64::consts::TAU;

use crate::error::AudioError;

/// Oscillator waveform (only sine tones are produced)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
}

/// Single oscillator descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneDescriptor {
    pub frequency_hz: f64,
    pub waveform: Waveform,
}

/// Left/right tone frequencies producing a binaural beat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonePair {
    pub left: ToneDescriptor,
    pub right: ToneDescriptor,
}

impl TonePair {
    /// Derive the per-ear tones from a carrier and a beat frequency.
    ///
    /// `left = base - beat/2`, `right = base + beat/2`. Rejects negative or
    /// non-finite input and any pair whose left tone would be at or below 0 Hz.
    pub fn derive(base_hz: f64, beat_hz: f64) -> Result<Self, AudioError> {
        let invalid = |reason| AudioError::InvalidTone {
            base_hz,
            beat_hz,
            reason,
        };

        if !base_hz.is_finite() || !beat_hz.is_finite() {
            return Err(invalid("frequencies must be finite"));
        }
        if beat_hz < 0.0 {
            return Err(invalid("beat frequency must be non-negative"));
        }

        let half_beat = beat_hz / 2.0;
        let left_hz = base_hz - half_beat;
        if left_hz <= 0.0 {
            return Err(invalid("left tone would be at or below 0 Hz"));
        }

        Ok(Self {
            left: ToneDescriptor {
                frequency_hz: left_hz,
                waveform: Waveform::Sine,
            },
            right: ToneDescriptor {
                frequency_hz: base_hz + half_beat,
                waveform: Waveform::Sine,
            },
        })
    }

    /// Perceived beat (difference between the ears)
    pub fn beat_hz(&self) -> f64 {
        self.right.frequency_hz - self.left.frequency_hz
    }
}

/// Sine oscillator with a normalized phase accumulator.
///
/// Changing the frequency only changes the per-sample increment, so the
/// waveform stays continuous across retunes.
#[derive(Debug, Clone)]
pub struct Oscillator {
    frequency_hz: f64,
    /// Phase in cycles, kept in [0, 1)
    phase: f64,
}

impl Oscillator {
    pub fn new(descriptor: ToneDescriptor) -> Self {
        Self {
            frequency_hz: descriptor.frequency_hz,
            phase: 0.0,
        }
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Retune without resetting phase
    pub fn set_frequency(&mut self, frequency_hz: f64) {
        self.frequency_hz = frequency_hz;
    }

    /// Produce the next sample and advance the phase
    pub fn next_sample(&mut self, sample_rate_hz: u32) -> f32 {
        let sample = (self.phase * TAU).sin() as f32;
        self.phase += self.frequency_hz / sample_rate_hz as f64;
        self.phase -= self.phase.floor();
        sample
    }
}
