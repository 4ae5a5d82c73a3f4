//! Spectral feature extraction.
//!
//! Reduces one analyser snapshot to a handful of scalars. Stateless: every
//! call depends only on the snapshot it is given.

/// Band features for a single frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpectralFeatures {
    /// Mean magnitude of the lower half of the bins (0..=255 scale)
    pub lower_avg: f32,
    /// Mean magnitude of the upper half of the bins
    pub upper_avg: f32,
    /// Peak magnitude of the lower half
    pub lower_max: f32,
    /// Peak magnitude of the upper half
    pub upper_max: f32,
    /// `lower_max` divided by the lower half's length
    pub lower_max_fr: f32,
    /// `upper_avg` divided by the upper half's length
    pub upper_avg_fr: f32,
}

impl SpectralFeatures {
    /// Split `bins` at the midpoint and reduce each half.
    ///
    /// Odd lengths put the extra bin in the upper half. Empty halves reduce to 0.
    pub fn from_bins(bins: &[u8]) -> Self {
        let (lower, upper) = bins.split_at(bins.len() / 2);
        let lower_half = HalfStats::of(lower);
        let upper_half = HalfStats::of(upper);

        Self {
            lower_avg: lower_half.avg,
            upper_avg: upper_half.avg,
            lower_max: lower_half.max,
            upper_max: upper_half.max,
            lower_max_fr: per_bin(lower_half.max, lower.len()),
            upper_avg_fr: per_bin(upper_half.avg, upper.len()),
        }
    }
}

struct HalfStats {
    avg: f32,
    max: f32,
}

impl HalfStats {
    fn of(bins: &[u8]) -> Self {
        if bins.is_empty() {
            return Self { avg: 0.0, max: 0.0 };
        }
        let sum: u32 = bins.iter().map(|&b| b as u32).sum();
        let max = bins.iter().copied().max().unwrap_or(0);
        Self {
            avg: sum as f32 / bins.len() as f32,
            max: max as f32,
        }
    }
}

fn per_bin(value: f32, len: usize) -> f32 {
    if len == 0 {
        0.0
    } else {
        value / len as f32
    }
}
