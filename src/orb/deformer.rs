//! Radial noise deformation driven by spectral features.
//!
//! Each frame every live vertex is placed along its rest direction at
//! `rest_radius + lower_max_fr + noise(dir + drift(t)) * amplitude * upper_avg_fr`.
//! Rest positions are snapshotted once, on the first deformation, so the
//! displacement never compounds.

use glam::Vec3;

use super::Vertex;
use crate::features::SpectralFeatures;
use crate::noise::{NoiseField, DEFAULT_SEED};
use crate::params::OrbPhysics;

/// Whether the rest snapshot has been taken yet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeformState {
    Resting,
    Deforming,
}

pub struct Deformer {
    rest_radius: f32,
    noise_amplitude: f32,
    noise_time_rates: [f64; 3],
    noise: NoiseField,
    rest: Option<Vec<Vec3>>,
}

impl Deformer {
    pub fn new(physics: &OrbPhysics) -> Self {
        let noise = if physics.noise_seed == DEFAULT_SEED {
            NoiseField::shared().clone()
        } else {
            NoiseField::new(physics.noise_seed)
        };

        Self {
            rest_radius: physics.rest_radius,
            noise_amplitude: physics.noise_amplitude,
            noise_time_rates: physics.noise_time_rates,
            noise,
            rest: None,
        }
    }

    pub fn state(&self) -> DeformState {
        if self.rest.is_some() {
            DeformState::Deforming
        } else {
            DeformState::Resting
        }
    }

    /// Rest snapshot, once taken
    pub fn rest_positions(&self) -> Option<&[Vec3]> {
        self.rest.as_deref()
    }

    /// Rewrite `live` in place for the given features at `time_ms`.
    ///
    /// The first call snapshots `live` as the rest shape; later calls must
    /// pass a buffer of the same length.
    pub fn deform(&mut self, live: &mut [Vertex], features: &SpectralFeatures, time_ms: f64) {
        let rest = self
            .rest
            .get_or_insert_with(|| live.iter().map(|v| Vec3::from_array(v.position)).collect());
        debug_assert_eq!(rest.len(), live.len(), "mesh topology changed after snapshot");

        let [kx, ky, kz] = self.noise_time_rates;
        let drift = [time_ms * kx, time_ms * ky, time_ms * kz];
        let base = self.rest_radius + features.lower_max_fr;
        let swing = self.noise_amplitude * features.upper_avg_fr;

        for (vertex, rest) in live.iter_mut().zip(rest.iter()) {
            let dir = rest.normalize_or_zero();
            let n = self.noise.sample_3d(
                dir.x as f64 + drift[0],
                dir.y as f64 + drift[1],
                dir.z as f64 + drift[2],
            );
            vertex.position = (dir * (base + n * swing)).to_array();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orb::OrbMesh;
    use proptest::prelude::*;

    fn features(lower_max_fr: f32, upper_avg_fr: f32) -> SpectralFeatures {
        SpectralFeatures {
            lower_max_fr,
            upper_avg_fr,
            ..Default::default()
        }
    }

    fn positions(vertices: &[Vertex]) -> Vec<Vec3> {
        vertices.iter().map(|v| Vec3::from_array(v.position)).collect()
    }

    #[test]
    fn test_snapshot_taken_once() {
        let mut mesh = OrbMesh::icosphere(2.0, 1);
        let original = positions(&mesh.vertices);
        let mut deformer = Deformer::new(&OrbPhysics::default());
        assert_eq!(deformer.state(), DeformState::Resting);
        assert!(deformer.rest_positions().is_none());

        deformer.deform(&mut mesh.vertices, &features(1.5, 1.0), 0.0);
        assert_eq!(deformer.state(), DeformState::Deforming);
        deformer.deform(&mut mesh.vertices, &features(0.2, 1.9), 5_000.0);

        // Snapshot still matches the undeformed sphere
        assert_eq!(deformer.rest_positions(), Some(&original[..]));
    }

    #[test]
    fn test_silent_features_restore_rest_sphere() {
        let mut mesh = OrbMesh::icosphere(2.0, 1);
        let original = positions(&mesh.vertices);
        let mut deformer = Deformer::new(&OrbPhysics::default());

        deformer.deform(&mut mesh.vertices, &features(1.9, 1.9), 100.0);
        deformer.deform(&mut mesh.vertices, &features(0.0, 0.0), 200.0);

        for (live, rest) in positions(&mesh.vertices).iter().zip(&original) {
            assert!((*live - *rest).length() < 1e-5);
        }
    }

    #[test]
    fn test_lower_band_grows_uniformly() {
        let mut mesh = OrbMesh::icosphere(2.0, 1);
        let mut deformer = Deformer::new(&OrbPhysics::default());

        deformer.deform(&mut mesh.vertices, &features(0.75, 0.0), 1_000.0);

        for live in positions(&mesh.vertices) {
            assert!((live.length() - 2.75).abs() < 1e-5);
        }
    }

    #[test]
    fn test_same_inputs_same_shape() {
        let physics = OrbPhysics::default();
        let mut a = OrbMesh::icosphere(2.0, 1);
        let mut b = OrbMesh::icosphere(2.0, 1);

        Deformer::new(&physics).deform(&mut a.vertices, &features(0.8, 1.2), 4_321.0);
        Deformer::new(&physics).deform(&mut b.vertices, &features(0.8, 1.2), 4_321.0);

        assert_eq!(a.vertices, b.vertices);
    }

    proptest! {
        #[test]
        fn prop_vertices_stay_on_rest_rays(
            lower_max_fr in 0.0f32..=255.0 / 128.0,
            upper_avg_fr in 0.0f32..=255.0 / 128.0,
            time_ms in 0.0f64..1.0e7,
        ) {
            let mut mesh = OrbMesh::icosphere(2.0, 1);
            let mut deformer = Deformer::new(&OrbPhysics::default());
            deformer.deform(&mut mesh.vertices, &features(lower_max_fr, upper_avg_fr), time_ms);

            let rest = deformer.rest_positions().unwrap_or_default().to_vec();
            for (live, rest) in positions(&mesh.vertices).iter().zip(&rest) {
                // Collinear with the rest direction and on the same side
                prop_assert!(live.cross(*rest).length() < 1e-3);
                prop_assert!(live.dot(*rest) > 0.0);
                prop_assert!(live.length() >= 1.0);
            }
        }
    }
}
