//! Texture atlas for merged faces
//!
//! Every merged face owns a block of texels, one per voxel it spans, holding
//! that voxel's color. Blocks are shelf-packed into a power-of-two image and
//! each poly corner maps to the matching corner of its block.

use crate::matrix::{MatrixError, MatrixFace, VoxelMatrix};
use crate::mesh::VoxMesh;
use crate::tree::Color;
use glam::Vec2;
use std::cmp::Reverse;

/// Placement of one face inside the atlas, in texels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct TextureAtlas {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Color>,
    /// Region per matrix, per face
    regions: Vec<Vec<AtlasRegion>>,
}

impl TextureAtlas {
    /// Pack the faces of `matrices` and copy in their voxel colors
    pub fn build(matrices: &[VoxelMatrix]) -> Result<TextureAtlas, MatrixError> {
        let mut blocks: Vec<(usize, usize, u32, u32)> = Vec::new();
        for (mi, matrix) in matrices.iter().enumerate() {
            for (fi, face) in matrix.faces().iter().enumerate() {
                let (w, h) = face.plane_extent();
                blocks.push((mi, fi, w, h));
            }
        }
        // Tallest first packs shelves tighter; stable sort keeps ties in face order
        blocks.sort_by_key(|&(_, _, w, h)| (Reverse(h), Reverse(w)));

        let area: u64 = blocks.iter().map(|&(_, _, w, h)| w as u64 * h as u64).sum();
        let widest = blocks.iter().map(|&(_, _, w, _)| w).max().unwrap_or(1);
        let side = (area as f64).sqrt().ceil() as u32;
        let width = side.max(widest).max(1).next_power_of_two();

        let mut regions: Vec<Vec<AtlasRegion>> = matrices
            .iter()
            .map(|m| vec![AtlasRegion { x: 0, y: 0, width: 0, height: 0 }; m.faces().len()])
            .collect();

        let (mut cursor_x, mut shelf_y, mut shelf_height) = (0u32, 0u32, 0u32);
        for &(mi, fi, w, h) in &blocks {
            if cursor_x + w > width {
                shelf_y += shelf_height;
                cursor_x = 0;
                shelf_height = 0;
            }
            regions[mi][fi] = AtlasRegion {
                x: cursor_x,
                y: shelf_y,
                width: w,
                height: h,
            };
            cursor_x += w;
            shelf_height = shelf_height.max(h);
        }
        let height = (shelf_y + shelf_height).max(1).next_power_of_two();

        let mut pixels = vec![Color::CLEAR; width as usize * height as usize];
        for (matrix, matrix_regions) in matrices.iter().zip(&regions) {
            for (face, region) in matrix.faces().iter().zip(matrix_regions) {
                for v in 0..region.height {
                    for u in 0..region.width {
                        let voxel = matrix.voxel(face.voxel_at(u, v))?;
                        let idx = (region.y + v) as usize * width as usize + (region.x + u) as usize;
                        pixels[idx] = voxel.color;
                    }
                }
            }
        }

        tracing::debug!(width, height, faces = blocks.len(), "packed texture atlas");

        Ok(TextureAtlas {
            width,
            height,
            pixels,
            regions,
        })
    }

    pub fn region(&self, matrix: usize, face: usize) -> Option<AtlasRegion> {
        self.regions.get(matrix)?.get(face).copied()
    }

    /// Atlas UVs for the four corners of `face`, in corner order
    pub fn face_uvs(&self, matrix: &VoxelMatrix, face: &MatrixFace, region: AtlasRegion) -> [Vec2; 4] {
        let origin = (matrix.world_position + face.rect_start).as_vec3();
        let size = Vec2::new(self.width as f32, self.height as f32);
        let column = face.side.column_axis();
        let row = face.side.row_axis();
        face.points.map(|point| {
            let local = point - origin;
            Vec2::new(region.x as f32 + local[column], region.y as f32 + local[row]) / size
        })
    }

    /// Write atlas UVs into meshes built from the same matrices
    pub fn apply(&self, matrices: &[VoxelMatrix], meshes: &mut [VoxMesh]) {
        for (mi, (matrix, mesh)) in matrices.iter().zip(meshes.iter_mut()).enumerate() {
            for (fi, (face, poly)) in matrix.faces().iter().zip(mesh.polys.iter_mut()).enumerate() {
                let Some(region) = self.region(mi, fi) else {
                    continue;
                };
                let uvs = self.face_uvs(matrix, face, region);
                for (point, uv) in poly.points.iter_mut().zip(uvs) {
                    point.uv = uv;
                }
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Raw RGBA8 bytes, row-major
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_rgba()).collect()
    }

    #[cfg(feature = "png")]
    pub fn save_png(&self, path: &std::path::Path) -> image::ImageResult<()> {
        image::save_buffer(
            path,
            &self.to_rgba8(),
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::assemble_meshes;
    use crate::side::Side;
    use crate::tree::{NodeDesc, SceneBuilder, VoxelScene};
    use glam::{IVec3, UVec3, Vec3};

    const RED: Color = Color::new(255, 0, 0, 255);
    const BLUE: Color = Color::new(0, 0, 255, 255);

    fn bar_scene() -> VoxelScene {
        let mut builder = SceneBuilder::new(NodeDesc::model("m"));
        let root = builder.root();
        builder.push(
            root,
            NodeDesc::matrix("Bar", IVec3::ZERO, UVec3::new(2, 1, 1), vec![RED, BLUE]),
        );
        builder.build(Vec3::ONE)
    }

    #[test]
    fn test_merged_face_carries_every_voxel_color() {
        let scene = bar_scene();
        let matrix = VoxelMatrix::build(&scene, scene.root().children[0]).unwrap();
        let atlas = TextureAtlas::build(std::slice::from_ref(&matrix)).unwrap();

        let (fi, top) = matrix
            .faces()
            .iter()
            .enumerate()
            .find(|(_, f)| f.side == Side::Top)
            .unwrap();
        let region = atlas.region(0, fi).unwrap();
        assert_eq!((region.width, region.height), (2, 1));
        assert_eq!(atlas.pixel(region.x, region.y), Some(RED));
        assert_eq!(atlas.pixel(region.x + 1, region.y), Some(BLUE));

        let uvs = atlas.face_uvs(&matrix, top, region);
        for uv in uvs {
            assert!((0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y));
        }
    }

    #[test]
    fn test_atlas_is_power_of_two_and_regions_disjoint() {
        let scene = bar_scene();
        let matrix = VoxelMatrix::build(&scene, scene.root().children[0]).unwrap();
        let atlas = TextureAtlas::build(std::slice::from_ref(&matrix)).unwrap();

        assert!(atlas.width.is_power_of_two());
        assert!(atlas.height.is_power_of_two());

        let regions: Vec<AtlasRegion> = (0..matrix.faces().len())
            .map(|fi| atlas.region(0, fi).unwrap())
            .collect();
        for (i, a) in regions.iter().enumerate() {
            assert!(a.x + a.width <= atlas.width && a.y + a.height <= atlas.height);
            for b in &regions[i + 1..] {
                let overlap = a.x < b.x + b.width
                    && b.x < a.x + a.width
                    && a.y < b.y + b.height
                    && b.y < a.y + a.height;
                assert!(!overlap, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_apply_sets_uvs() {
        let scene = bar_scene();
        let matrix = VoxelMatrix::build(&scene, scene.root().children[0]).unwrap();
        let matrices = vec![matrix];
        let mut meshes = assemble_meshes(&matrices);
        let atlas = TextureAtlas::build(&matrices).unwrap();
        atlas.apply(&matrices, &mut meshes);

        for poly in &meshes[0].polys {
            let distinct: std::collections::HashSet<[u32; 2]> = poly
                .points
                .iter()
                .map(|p| [p.uv.x.to_bits(), p.uv.y.to_bits()])
                .collect();
            assert_eq!(distinct.len(), 4);
        }
    }
}
