//! Orb geometry and deformation parameters.

/// Reactive orb parameters
#[derive(Debug, Clone)]
pub struct OrbPhysics {
    /// Base radius of the undeformed icosphere (world units)
    pub rest_radius: f32,

    /// Icosahedron subdivision level (1 = each face split into 4)
    pub detail: u32,

    /// Noise displacement amplitude (world units per unit of upper-band energy)
    pub noise_amplitude: f32,

    /// Noise field drift per millisecond along X, Y, Z
    /// Distinct rates keep the field from sliding along a single diagonal
    pub noise_time_rates: [f64; 3],

    /// Constant rotation applied about X and Y every frame (radians)
    pub rotation_step_rad: f32,

    /// Perlin noise seed
    pub noise_seed: u32,
}

impl Default for OrbPhysics {
    fn default() -> Self {
        Self {
            rest_radius: 2.0,
            detail: 1,
            noise_amplitude: 0.5,
            noise_time_rates: [0.000_07, 0.000_08, 0.000_09],
            rotation_step_rad: 0.001,
            noise_seed: 0,
        }
    }
}

/// Background orb parameters (always visible, never deformed)
#[derive(Debug, Clone)]
pub struct BackdropConfig {
    /// Radius (world units)
    pub radius: f32,

    /// Icosahedron subdivision level
    pub detail: u32,

    /// Rotation about X and Y per frame (radians)
    pub rotation_step_rad: f32,

    /// Line colour (linear RGBA, alpha = opacity)
    pub color: [f32; 4],
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            radius: 2.5,
            detail: 1,
            rotation_step_rad: 0.0005,
            // #1d4ed8 at 50% opacity
            color: [0.114, 0.306, 0.847, 0.5],
        }
    }
}
