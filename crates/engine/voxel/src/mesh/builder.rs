use serde::{Deserialize, Serialize};

/// Builder interface for turning voxel quads into renderable buffers
pub trait MeshBuilder {
    /// Add a single quad
    ///
    /// # Arguments
    /// * `vertices` - Four corners, wound outward
    /// * `normal` - Face normal
    /// * `uvs` - Texture coordinate per corner
    /// * `color` - RGBA color in 0-1 range
    fn add_face(&mut self, vertices: [[f32; 3]; 4], normal: [f32; 3], uvs: [[f32; 2]; 4], color: [f32; 4]);
}

/// Flat triangle buffers accumulated from quads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleMeshBuilder {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub colors: Vec<f32>,
    vertex_count: u32,
}

impl TriangleMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl MeshBuilder for TriangleMeshBuilder {
    fn add_face(&mut self, vertices: [[f32; 3]; 4], normal: [f32; 3], uvs: [[f32; 2]; 4], color: [f32; 4]) {
        let base_index = self.vertex_count;

        for (vertex, uv) in vertices.iter().zip(uvs.iter()) {
            self.vertices.extend_from_slice(vertex);
            self.normals.extend_from_slice(&normal);
            self.uvs.extend_from_slice(uv);
            self.colors.extend_from_slice(&color);
        }

        // Two triangles (0,1,2) and (0,2,3)
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        self.vertex_count += 4;
    }
}
