//! Binaural Orb - binaural beat generator with an audio-reactive orb

pub mod audio;
pub mod camera;
pub mod cli;
pub mod error;
pub mod export;
pub mod features;
pub mod logging;
pub mod noise;
pub mod orb;
pub mod params;
pub mod render_loop;
pub mod rendering;
pub mod ui;
