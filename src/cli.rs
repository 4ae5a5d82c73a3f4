//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

use crate::audio::AudioBackend;
use crate::params::{MoodPreset, RenderConfig, PRESETS};

/// Preset used when only frequencies are given
const DEFAULT_RATING: u8 = 3;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "binaural-orb")]
#[command(about = "Binaural beat generator with an audio-reactive orb", long_about = None)]
pub struct Args {
    /// Skip the mood screen and open the player for this rating (1-5)
    #[arg(long, value_name = "RATING", value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: Option<u8>,

    /// Override the preset's base frequency (Hz)
    #[arg(long, value_name = "HZ")]
    pub base: Option<f64>,

    /// Override the preset's beat frequency (Hz)
    #[arg(long, value_name = "HZ")]
    pub beat: Option<f64>,

    /// Start playing as soon as the player opens
    #[arg(long)]
    pub autoplay: bool,

    /// Run the visuals without opening an audio device
    #[arg(long)]
    pub no_audio: bool,

    /// Initial window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    /// Initial window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,

    /// Default log level (RUST_LOG overrides)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Render the tone pair to a WAV file instead of opening a window
    #[arg(long, value_name = "PATH")]
    pub export_wav: Option<PathBuf>,

    /// Length of the exported WAV (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "10")]
    pub seconds: f64,
}

impl Args {
    /// Rating to open the player with, if the mood screen is skipped
    pub fn start_rating(&self) -> Option<u8> {
        self.rating
            .or_else(|| (self.base.is_some() || self.beat.is_some()).then_some(DEFAULT_RATING))
    }

    /// Base and beat frequency for export or the first player screen
    pub fn frequencies(&self) -> (f64, f64) {
        let rating = self.start_rating().unwrap_or(DEFAULT_RATING);
        let preset = MoodPreset::for_rating(rating).unwrap_or(&PRESETS[0]);
        (
            self.base.unwrap_or(preset.base_hz),
            self.beat.unwrap_or(preset.beat_hz),
        )
    }

    pub fn audio_backend(&self) -> AudioBackend {
        if self.no_audio {
            AudioBackend::Disabled
        } else {
            AudioBackend::Device
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("binaural-orb").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.start_rating(), None);
        assert_eq!(args.frequencies(), (126.22, 10.0));
        assert_eq!(args.audio_backend(), AudioBackend::Device);
        assert_eq!(args.log_level, LevelFilter::INFO);
        assert!(!args.autoplay);

        let render = args.render_config();
        assert_eq!((render.window_width, render.window_height), (1280, 720));
    }

    #[test]
    fn test_rating_and_overrides() {
        let args = parse(&["--rating", "4", "--beat", "6.5", "--no-audio", "--autoplay"]);
        assert_eq!(args.start_rating(), Some(4));
        assert_eq!(args.frequencies(), (221.23, 6.5));
        assert_eq!(args.audio_backend(), AudioBackend::Disabled);
        assert!(args.autoplay);
    }

    #[test]
    fn test_frequency_alone_opens_player() {
        let args = parse(&["--base", "300"]);
        assert_eq!(args.start_rating(), Some(DEFAULT_RATING));
        assert_eq!(args.frequencies(), (300.0, 10.0));
    }

    #[test]
    fn test_rejects_out_of_range_rating() {
        assert!(Args::try_parse_from(["binaural-orb", "--rating", "6"]).is_err());
        assert!(Args::try_parse_from(["binaural-orb", "--rating", "0"]).is_err());
    }

    #[test]
    fn test_export_args() {
        let args = parse(&["--export-wav", "out.wav", "--seconds", "2.5", "--log-level", "debug"]);
        assert_eq!(args.export_wav, Some(PathBuf::from("out.wav")));
        assert_eq!(args.seconds, 2.5);
        assert_eq!(args.log_level, LevelFilter::DEBUG);
    }
}
