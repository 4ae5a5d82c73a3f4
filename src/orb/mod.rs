//! Audio-reactive orb: icosphere mesh, radial noise deformer, and rotation.

mod deformer;
mod mesh;
mod system;

use bytemuck::{Pod, Zeroable};

// Re-export public types
pub use deformer::{DeformState, Deformer};
pub use mesh::OrbMesh;
pub use system::{BackdropOrb, OrbSystem};

/// Vertex data for orb meshes (position only; colour comes from uniforms)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}
