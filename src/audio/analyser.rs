//! Analysis tap: windowed FFT with smoothing and byte-scaled magnitudes.
//!
//! Produces the same kind of snapshot as a browser analyser node: the most
//! recent `fft_size` samples are Blackman-windowed, transformed, smoothed
//! against the previous snapshot, converted to decibels and mapped onto
//! 0..=255 between `min_decibels` and `max_decibels`.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::error::AudioError;
use crate::params::AnalyserConfig;

/// Non-destructive spectral monitor
pub struct AnalysisTap {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl AnalysisTap {
    pub fn new(config: AnalyserConfig) -> Result<Self, AudioError> {
        config.validate()?;

        let size = config.fft_size;
        let bins = config.frequency_bin_count();
        let fft = FftPlanner::new().plan_fft_forward(size);
        let window = (0..size).map(|i| blackman_window(i, size)).collect();

        Ok(Self {
            config,
            fft,
            window,
            time_domain: vec![0.0; size],
            spectrum: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; bins],
            bytes: vec![0; bins],
        })
    }

    /// Snapshot length (half the window size)
    pub fn frequency_bin_count(&self) -> usize {
        self.bytes.len()
    }

    /// Input buffer for the next analysis, oldest sample first
    pub fn time_domain_mut(&mut self) -> &mut [f32] {
        &mut self.time_domain
    }

    /// Latest byte snapshot without re-analysing
    pub fn byte_frequency_data(&self) -> &[u8] {
        &self.bytes
    }

    /// Analyse the samples currently in the input buffer
    pub fn analyse(&mut self) -> &[u8] {
        for ((out, &sample), &w) in self
            .spectrum
            .iter_mut()
            .zip(&self.time_domain)
            .zip(&self.window)
        {
            *out = Complex::new(sample * w, 0.0);
        }

        self.fft.process(&mut self.spectrum);

        let scale = 1.0 / self.config.fft_size as f32;
        let tau = self.config.smoothing;
        let db_range = self.config.max_decibels - self.config.min_decibels;

        for ((smoothed, byte), bin) in self
            .smoothed
            .iter_mut()
            .zip(self.bytes.iter_mut())
            .zip(&self.spectrum)
        {
            let magnitude = bin.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            let db = 20.0 * smoothed.log10();
            let scaled = 255.0 * (db - self.config.min_decibels) / db_range;
            // log10(0) is -inf, which saturates to 0 here
            *byte = if scaled.is_nan() {
                0
            } else {
                scaled.floor().clamp(0.0, 255.0) as u8
            };
        }

        &self.bytes
    }

    /// Copy `samples` into the input buffer and analyse them
    pub fn analyse_samples(&mut self, samples: &[f32]) -> &[u8] {
        let n = samples.len().min(self.time_domain.len());
        let pad = self.time_domain.len() - n;
        self.time_domain[..pad].fill(0.0);
        self.time_domain[pad..].copy_from_slice(&samples[samples.len() - n..]);
        self.analyse()
    }
}

/// Periodic Blackman window (a0 = 0.42, a1 = 0.5, a2 = 0.08)
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}
