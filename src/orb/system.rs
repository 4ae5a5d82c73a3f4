//! High-level orb systems: the reactive orb and the static backdrop.

use glam::{EulerRot, Mat4, Vec2};

use super::deformer::{DeformState, Deformer};
use super::mesh::OrbMesh;
use crate::features::SpectralFeatures;
use crate::params::{BackdropConfig, OrbPhysics};

/// Accumulated X/Y rotation, applied as an XYZ Euler transform
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spin {
    angles: Vec2,
}

impl Spin {
    fn advance(&mut self, step_rad: f32) {
        self.angles += Vec2::splat(step_rad);
    }

    fn matrix(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.angles.x, self.angles.y, 0.0)
    }
}

/// Audio-reactive orb: deformed by features, rotating every frame
pub struct OrbSystem {
    pub mesh: OrbMesh,
    deformer: Deformer,
    spin: Spin,
    rotation_step_rad: f32,
}

impl OrbSystem {
    pub fn new(physics: &OrbPhysics) -> Self {
        Self {
            mesh: OrbMesh::icosphere(physics.rest_radius, physics.detail),
            deformer: Deformer::new(physics),
            spin: Spin::default(),
            rotation_step_rad: physics.rotation_step_rad,
        }
    }

    /// Advance one frame.
    ///
    /// With `features` the mesh is re-deformed for `time_ms`; without them it
    /// keeps its last shape. Rotation advances either way.
    pub fn update(&mut self, features: Option<&SpectralFeatures>, time_ms: f64) {
        if let Some(features) = features {
            self.deformer
                .deform(&mut self.mesh.vertices, features, time_ms);
            self.mesh.mark_dirty();
        }
        self.spin.advance(self.rotation_step_rad);
    }

    pub fn deform_state(&self) -> DeformState {
        self.deformer.state()
    }

    pub fn deformer(&self) -> &Deformer {
        &self.deformer
    }

    /// Current (x, y) rotation in radians
    pub fn rotation(&self) -> Vec2 {
        self.spin.angles
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.spin.matrix()
    }
}

/// Large slowly rotating orb drawn behind the reactive one
pub struct BackdropOrb {
    pub mesh: OrbMesh,
    pub color: [f32; 4],
    spin: Spin,
    rotation_step_rad: f32,
}

impl BackdropOrb {
    pub fn new(config: &BackdropConfig) -> Self {
        Self {
            mesh: OrbMesh::icosphere(config.radius, config.detail),
            color: config.color,
            spin: Spin::default(),
            rotation_step_rad: config.rotation_step_rad,
        }
    }

    pub fn update(&mut self) {
        self.spin.advance(self.rotation_step_rad);
    }

    pub fn rotation(&self) -> Vec2 {
        self.spin.angles
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.spin.matrix()
    }
}
