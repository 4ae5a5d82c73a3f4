//! Rendering and post-processing configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Initial window width (pixels)
    pub window_width: u32,

    /// Initial window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Camera distance from the origin along +Z (world units)
    pub camera_distance: f32,

    /// Background clear colour (#111827)
    pub clear_color: [f64; 4],

    /// Ambient light colour (#aaaaaa), the only light in the scene
    pub ambient_light: [f32; 3],

    /// Orb wireframe base colour
    pub orb_color: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 75.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            camera_distance: 5.0,
            clear_color: [0.067, 0.094, 0.153, 1.0],
            ambient_light: [0.667, 0.667, 0.667],
            orb_color: [1.0, 1.0, 1.0],
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Bloom (glow) pass configuration
#[derive(Debug, Clone)]
pub struct BloomConfig {
    /// Intensity of the blurred highlights added back onto the scene
    pub strength: f32,

    /// Blur spread in [0, 1] (scales the kernel footprint)
    pub radius: f32,

    /// Luminance below which pixels do not glow (0 = everything glows)
    pub threshold: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            strength: 1.2,
            radius: 0.5,
            threshold: 0.0,
        }
    }
}
