//! Rendering: the frame renderer seam, composite sizing, and the wgpu backend.

mod bloom;
mod gpu;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::error::RenderError;
use crate::orb::Vertex;

pub use gpu::GpuRenderer;

/// Uniform buffer for the orb line shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OrbUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Uniform buffer shared by the bloom passes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BloomUniforms {
    pub texel_size: [f32; 2],
    pub direction: [f32; 2],
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    pub _padding: f32, // Padding for alignment
}

/// Target sizes derived from the viewport
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeLayout {
    /// Full-resolution scene and swapchain size
    pub surface: (u32, u32),
    /// Half-resolution bloom targets
    pub bloom: (u32, u32),
}

impl CompositeLayout {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            surface: (width, height),
            bloom: ((width / 2).max(1), (height / 2).max(1)),
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface.0 as f32 / self.surface.1 as f32
    }
}

/// Everything a renderer needs for one frame
#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    pub view_proj: Mat4,
    /// `None` when the reactive orb is not mounted
    pub orb: Option<OrbDraw<'a>>,
    pub backdrop_model: Mat4,
}

#[derive(Clone, Copy, Debug)]
pub struct OrbDraw<'a> {
    pub model: Mat4,
    /// Live vertices to upload, present only when they changed
    pub vertices: Option<&'a [Vertex]>,
}

/// Draws frames and follows viewport size changes
pub trait FrameRenderer {
    fn resize(&mut self, layout: &CompositeLayout);

    fn render(&mut self, frame: &FrameInput<'_>) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_halves_bloom_targets() {
        let layout = CompositeLayout::new(1200, 800);
        assert_eq!(layout.surface, (1200, 800));
        assert_eq!(layout.bloom, (600, 400));
        assert!((layout.aspect_ratio() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_layout_never_zero() {
        let layout = CompositeLayout::new(0, 1);
        assert_eq!(layout.surface, (1, 1));
        assert_eq!(layout.bloom, (1, 1));
    }

    #[test]
    fn test_uniform_sizes_are_aligned() {
        assert_eq!(std::mem::size_of::<OrbUniforms>(), 144);
        assert_eq!(std::mem::size_of::<BloomUniforms>(), 32);
    }
}
