//! Mood presets and player control ranges.

/// Frequency pair offered for a mood rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodPreset {
    /// Star rating 1..=5
    pub rating: u8,

    /// Carrier frequency centred between the ears (Hz)
    pub base_hz: f64,

    /// Perceived beat frequency (Hz)
    pub beat_hz: f64,

    pub label: &'static str,
}

/// Rating → preset table
pub const PRESETS: [MoodPreset; 5] = [
    // Anxious: beta for focus
    MoodPreset {
        rating: 1,
        base_hz: 136.1,
        beat_hz: 13.0,
        label: "Stress Relief",
    },
    // Sad: beta for energy
    MoodPreset {
        rating: 2,
        base_hz: 141.27,
        beat_hz: 15.0,
        label: "Energy Boost",
    },
    // Neutral: alpha
    MoodPreset {
        rating: 3,
        base_hz: 126.22,
        beat_hz: 10.0,
        label: "Calm Focus",
    },
    // Good: theta (Schumann resonance)
    MoodPreset {
        rating: 4,
        base_hz: 221.23,
        beat_hz: 7.83,
        label: "Relaxation",
    },
    // Excellent: theta/delta
    MoodPreset {
        rating: 5,
        base_hz: 194.18,
        beat_hz: 4.0,
        label: "Deep Meditation",
    },
];

impl MoodPreset {
    /// Look up the preset for a star rating
    pub fn for_rating(rating: u8) -> Option<&'static MoodPreset> {
        PRESETS.iter().find(|p| p.rating == rating)
    }
}

/// Allowed ranges and keyboard steps for the two player sliders
#[derive(Debug, Clone)]
pub struct ControlRanges {
    /// Base frequency range (Hz)
    pub base_hz: (f64, f64),

    /// Beat frequency range (Hz)
    pub beat_hz: (f64, f64),

    /// Slider resolution (Hz)
    pub resolution_hz: f64,

    /// Base frequency keyboard step (coarse, fine) in Hz
    pub base_step_hz: (f64, f64),

    /// Beat frequency keyboard step (coarse, fine) in Hz
    pub beat_step_hz: (f64, f64),
}

impl Default for ControlRanges {
    fn default() -> Self {
        Self {
            base_hz: (30.0, 500.0),
            beat_hz: (0.5, 30.0),
            resolution_hz: 0.01,
            base_step_hz: (1.0, 0.1),
            beat_step_hz: (0.5, 0.05),
        }
    }
}

impl ControlRanges {
    /// Clamp a base frequency to its slider range, snapped to slider resolution
    pub fn clamp_base(&self, hz: f64) -> f64 {
        self.snap(hz.clamp(self.base_hz.0, self.base_hz.1))
    }

    /// Clamp a beat frequency to its slider range, snapped to slider resolution
    pub fn clamp_beat(&self, hz: f64) -> f64 {
        self.snap(hz.clamp(self.beat_hz.0, self.beat_hz.1))
    }

    fn snap(&self, hz: f64) -> f64 {
        (hz / self.resolution_hz).round() * self.resolution_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rating_has_a_preset() {
        for rating in 1..=5 {
            let preset = MoodPreset::for_rating(rating).unwrap();
            assert_eq!(preset.rating, rating);
        }
        assert!(MoodPreset::for_rating(0).is_none());
        assert!(MoodPreset::for_rating(6).is_none());
    }

    #[test]
    fn test_presets_fit_control_ranges() {
        let ranges = ControlRanges::default();
        for preset in &PRESETS {
            assert!((ranges.clamp_base(preset.base_hz) - preset.base_hz).abs() < 1e-9);
            assert!((ranges.clamp_beat(preset.beat_hz) - preset.beat_hz).abs() < 1e-9);
        }
    }

    #[test]
    fn test_clamping() {
        let ranges = ControlRanges::default();
        assert!((ranges.clamp_base(10.0) - 30.0).abs() < 1e-9);
        assert!((ranges.clamp_base(900.0) - 500.0).abs() < 1e-9);
        assert!((ranges.clamp_beat(0.0) - 0.5).abs() < 1e-9);
        assert!((ranges.clamp_beat(45.0) - 30.0).abs() < 1e-9);
        assert!((ranges.clamp_base(136.1234) - 136.12).abs() < 1e-9);
    }
}
