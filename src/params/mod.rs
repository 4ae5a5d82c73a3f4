//! Parameter definitions with physical units and documented semantics.
//!
//! All tuning constants live here with:
//! - Physical units (Hz, radians, milliseconds, pixels)
//! - Documented ranges and meanings
//! - Validation where a bad value would break an invariant

mod audio;
mod orb;
mod presets;
mod render;

// Re-export all types
pub use audio::{AnalyserConfig, SynthConfig};
pub use orb::{BackdropConfig, OrbPhysics};
pub use presets::{ControlRanges, MoodPreset, PRESETS};
pub use render::{BloomConfig, RenderConfig};
