//! Synthesis and spectral analysis configuration.

use crate::error::AudioError;

/// Tone synthesis configuration
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Output gain applied after the stereo merge (linear)
    pub gain: f32,

    /// Safety limiter: samples are hard-clipped to ±this value
    pub limiter_ceiling: f32,

    /// Sample rate used when no audio device drives the graph (Hz)
    pub offline_sample_rate_hz: u32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            gain: 0.5,
            limiter_ceiling: 0.5,
            offline_sample_rate_hz: 44_100,
        }
    }
}

/// Analysis tap configuration (mirrors a browser analyser node)
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT window size in samples (power of two, 32..=32768)
    pub fft_size: usize,

    /// Temporal smoothing constant in [0, 1]
    /// 0 = no smoothing, 0.9 = slow decay
    pub smoothing: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing: 0.9,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of magnitude bins exposed per snapshot
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), AudioError> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(AudioError::InvalidConfig(format!(
                "FFT size must be a power of 2 in 32..=32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(AudioError::InvalidConfig(format!(
                "smoothing must be in [0, 1], got {}",
                self.smoothing
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(AudioError::InvalidConfig(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}
