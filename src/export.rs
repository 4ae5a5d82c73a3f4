//! Offline WAV export of a tone pair through the signal graph.

use std::path::Path;
use tracing::info;

use crate::audio::{SignalGraph, TonePair};
use crate::error::AudioError;
use crate::params::SynthConfig;

/// Frames rendered per block
const BLOCK_FRAMES: usize = 1024;

const CHANNELS: u16 = 2;

const BYTES_PER_FRAME: u64 = CHANNELS as u64 * 4;

/// Room left for the RIFF and format chunk headers
const WAV_HEADER_BYTES: u64 = 80;

/// Longest export whose data chunk still fits a 32-bit RIFF size
const MAX_WAV_FRAMES: u64 = (u32::MAX as u64 - WAV_HEADER_BYTES) / BYTES_PER_FRAME;

/// What was written
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    pub tones: TonePair,
    pub sample_rate_hz: u32,
    pub frames: u64,
}

/// Render `seconds` of the binaural pair for `base_hz`/`beat_hz` into a
/// stereo 32-bit float WAV at the offline sample rate.
pub fn export_wav(
    path: &Path,
    base_hz: f64,
    beat_hz: f64,
    seconds: f64,
    synth: &SynthConfig,
) -> Result<ExportSummary, AudioError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(AudioError::InvalidConfig(format!(
            "export duration must be a non-negative number of seconds, got {seconds}"
        )));
    }

    let sample_rate_hz = synth.offline_sample_rate_hz;
    let frames = (seconds * sample_rate_hz as f64).round();
    if frames > MAX_WAV_FRAMES as f64 {
        return Err(AudioError::InvalidConfig(format!(
            "export duration of {seconds} s exceeds the WAV size limit of {:.0} s",
            MAX_WAV_FRAMES as f64 / sample_rate_hz as f64
        )));
    }
    let total_frames = frames as u64;

    let tones = TonePair::derive(base_hz, beat_hz)?;

    let mut graph = SignalGraph::new(sample_rate_hz, synth, 0);
    graph.start_voices(tones);

    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate: sample_rate_hz,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;

    let mut block = vec![0.0f32; BLOCK_FRAMES * CHANNELS as usize];
    let mut remaining = total_frames;
    while remaining > 0 {
        let frames = remaining.min(BLOCK_FRAMES as u64) as usize;
        let samples = &mut block[..frames * CHANNELS as usize];
        graph.render(samples, CHANNELS as usize);
        for &sample in samples.iter() {
            writer.write_sample(sample)?;
        }
        remaining -= frames as u64;
    }
    writer.finalize()?;

    info!(
        path = %path.display(),
        left_hz = tones.left.frequency_hz,
        right_hz = tones.right.frequency_hz,
        frames = total_frames,
        "WAV exported"
    );

    Ok(ExportSummary {
        tones,
        sample_rate_hz,
        frames: total_frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_wav(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("binaural-orb-{}-{}.wav", name, std::process::id()))
    }

    #[test]
    fn test_export_writes_stereo_float_wav() {
        let path = temp_wav("export");
        let summary = export_wav(&path, 200.0, 10.0, 0.5, &SynthConfig::default()).unwrap();

        assert_eq!(summary.sample_rate_hz, 44_100);
        assert_eq!(summary.frames, 22_050);
        assert!((summary.tones.left.frequency_hz - 195.0).abs() < 1e-9);

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);

        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 44_100);
        assert!(samples.iter().all(|s| s.abs() <= 0.5));

        // Channels carry different tones
        let differs = samples
            .chunks(2)
            .any(|frame| (frame[0] - frame[1]).abs() > 0.01);
        assert!(differs);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_export_rejects_bad_input() {
        let path = temp_wav("rejected");
        let synth = SynthConfig::default();

        assert!(matches!(
            export_wav(&path, 200.0, 10.0, -1.0, &synth),
            Err(AudioError::InvalidConfig(_))
        ));
        assert!(matches!(
            export_wav(&path, 3.0, 10.0, 1.0, &synth),
            Err(AudioError::InvalidTone { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_rejects_durations_past_wav_limit() {
        let path = temp_wav("oversized");
        let synth = SynthConfig::default();

        let limit_s = MAX_WAV_FRAMES as f64 / synth.offline_sample_rate_hz as f64;
        assert!(limit_s > 3.0 * 3600.0);

        for seconds in [1e12, limit_s + 1.0] {
            assert!(matches!(
                export_wav(&path, 200.0, 10.0, seconds, &synth),
                Err(AudioError::InvalidConfig(_))
            ));
        }
        assert!(!path.exists());
    }
}
