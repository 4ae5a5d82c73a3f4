//! Icosphere mesh with triangle and wireframe edge indices.

use glam::Vec3;
use std::collections::{BTreeSet, HashMap};

use super::Vertex;

/// Golden ratio, the icosahedron's long/short edge proportion
const PHI: f32 = 1.618_034;

const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = [
    [-1.0, PHI, 0.0],
    [1.0, PHI, 0.0],
    [-1.0, -PHI, 0.0],
    [1.0, -PHI, 0.0],
    [0.0, -1.0, PHI],
    [0.0, 1.0, PHI],
    [0.0, -1.0, -PHI],
    [0.0, 1.0, -PHI],
    [PHI, 0.0, -1.0],
    [PHI, 0.0, 1.0],
    [-PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
];

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Fixed-topology polyhedral mesh.
///
/// `vertices` is the live buffer: it is rewritten in place every frame but
/// never resized, so vertex count and indices stay fixed for the mesh's life.
pub struct OrbMesh {
    pub vertices: Vec<Vertex>,
    /// Triangle list indices
    pub indices: Vec<u32>,
    /// Line list indices, one pair per unique edge
    pub edge_indices: Vec<u32>,
    radius: f32,
    /// Live vertices changed since the last upload
    dirty: bool,
}

impl OrbMesh {
    /// Build an icosahedron of `radius`, each face split into `(detail + 1)^2`
    /// triangles, with every vertex projected onto the sphere.
    pub fn icosphere(radius: f32, detail: u32) -> Self {
        let mut builder = SphereBuilder::new(radius);
        let cols = detail as usize + 1;

        for face in ICOSAHEDRON_FACES {
            let [a, b, c] = face;

            // Rows of lattice points from edge a-b towards corner c, each
            // point held as integer barycentric weights summing to `cols`
            let mut grid: Vec<Vec<u32>> = Vec::with_capacity(cols + 1);
            for i in 0..=cols {
                let rows = cols - i;
                let row = (0..=rows)
                    .map(|j| builder.vertex([(a, rows - j), (b, j), (c, i)], cols))
                    .collect();
                grid.push(row);
            }

            for i in 0..cols {
                for j in 0..(2 * (cols - i) - 1) {
                    let k = j / 2;
                    if j % 2 == 0 {
                        builder.triangle(grid[i][k + 1], grid[i + 1][k], grid[i][k]);
                    } else {
                        builder.triangle(grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]);
                    }
                }
            }
        }

        builder.finish()
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn edge_count(&self) -> usize {
        self.edge_indices.len() / 2
    }

    /// Flag the live buffer for upload
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear and return the upload flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Deduplicating vertex/triangle accumulator
struct SphereBuilder {
    radius: f32,
    vertices: Vec<Vertex>,
    lookup: HashMap<Vec<(usize, usize)>, u32>,
    indices: Vec<u32>,
}

impl SphereBuilder {
    fn new(radius: f32) -> Self {
        Self {
            radius,
            vertices: Vec::new(),
            lookup: HashMap::new(),
            indices: Vec::new(),
        }
    }

    /// Return the index of the vertex at the given corner weights, creating
    /// it on first use. Faces sharing an edge produce the same key.
    fn vertex(&mut self, weights: [(usize, usize); 3], total: usize) -> u32 {
        let mut key: Vec<(usize, usize)> = weights.into_iter().filter(|&(_, w)| w > 0).collect();
        key.sort_unstable();

        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }

        let point = key.iter().fold(Vec3::ZERO, |sum, &(corner, weight)| {
            sum + Vec3::from_array(ICOSAHEDRON_VERTICES[corner]) * weight as f32
        }) / total as f32;
        let position = point.normalize() * self.radius;

        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            position: position.to_array(),
        });
        self.lookup.insert(key, index);
        index
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    fn finish(self) -> OrbMesh {
        let mut edges = BTreeSet::new();
        for tri in self.indices.chunks(3) {
            for (from, to) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                edges.insert((from.min(to), from.max(to)));
            }
        }
        let edge_indices = edges.into_iter().flat_map(|(a, b)| [a, b]).collect();

        OrbMesh {
            vertices: self.vertices,
            indices: self.indices,
            edge_indices,
            radius: self.radius,
            dirty: true,
        }
    }
}
