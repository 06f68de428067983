//! Named polygon meshes built from merged matrix faces
//!
//! Each [`MatrixFace`](crate::matrix::MatrixFace) becomes one four-point
//! [`VoxPoly`]. UVs start at zero and are filled in by the texture atlas.

mod builder;

pub use builder::{MeshBuilder, TriangleMeshBuilder};

use crate::matrix::VoxelMatrix;
use crate::side::Side;
use crate::tree::{Color, NodeId};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxPoint {
    pub position: Vec3,
    pub uv: Vec2,
}

/// One quad, tagged with the side it faces
#[derive(Debug, Clone, PartialEq)]
pub struct VoxPoly {
    pub side: Side,
    pub color: Color,
    pub points: [VoxPoint; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoxMesh {
    /// Name of the source node
    pub name: String,
    pub node: NodeId,
    pub polys: Vec<VoxPoly>,
}

impl VoxMesh {
    /// One poly per merged face, in face order
    pub fn from_matrix(matrix: &VoxelMatrix) -> Self {
        let polys = matrix
            .faces()
            .iter()
            .map(|face| VoxPoly {
                side: face.side,
                color: face.color,
                points: face.points.map(|position| VoxPoint {
                    position,
                    uv: Vec2::ZERO,
                }),
            })
            .collect();

        Self {
            name: matrix.name.clone(),
            node: matrix.node,
            polys,
        }
    }

    /// Feed every quad into `builder`, positions multiplied by `scale`
    pub fn build_into<B: MeshBuilder>(&self, builder: &mut B, scale: f32) {
        for poly in &self.polys {
            let vertices = poly.points.map(|p| (p.position * scale).to_array());
            let uvs = poly.points.map(|p| p.uv.to_array());
            let [r, g, b] = poly.color.to_rgb_f32();
            builder.add_face(
                vertices,
                poly.side.normal().to_array(),
                uvs,
                [r, g, b, poly.color.a as f32 / 255.0],
            );
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.polys.len() * 2
    }
}

/// One mesh per matrix, in the order given
pub fn assemble_meshes(matrices: &[VoxelMatrix]) -> Vec<VoxMesh> {
    matrices.iter().map(VoxMesh::from_matrix).collect()
}
