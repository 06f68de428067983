//! Sparse voxel matrices with greedy face merging
//!
//! [`VoxelMatrix::build`] turns the dense payload of one Matrix or Compound
//! node into:
//!
//! - an occupancy map of drawable voxels (alpha > 1), colors forced opaque
//! - bounds, world center and half extents
//! - a list of merged [`MatrixFace`] rectangles, one per surviving rectangle
//!
//! A side is visible when the voxel sits on the matrix boundary on that axis,
//! or the neighboring payload cell is empty (alpha 0). Core voxels (alpha 1)
//! are never drawn but still hide their neighbors' faces.
//!
//! Merging is greedy and deterministic: the same payload always yields the
//! same rectangles in the same order.

mod error;
mod merge;

pub use error::MatrixError;
pub use merge::{FaceRect, RectId};

use crate::side::Side;
use crate::tree::{Color, NodeId, VoxelScene};
use glam::{IVec3, Vec3};
use merge::FaceMerger;

/// Alpha at or below which a payload cell is not drawn
pub const CORE_ALPHA: u8 = 1;

/// One drawable voxel and its six face slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voxel {
    pub color: Color,
    pub position: IVec3,
    /// Bit per [`Side::flag`]
    pub visible: u8,
    owned: [Option<RectId>; 6],
    faces: [Option<RectId>; 6],
}

impl Voxel {
    fn new(color: Color, position: IVec3) -> Self {
        Self {
            color,
            position,
            visible: 0,
            owned: [None; 6],
            faces: [None; 6],
        }
    }

    #[inline]
    pub fn is_visible(&self, side: Side) -> bool {
        self.visible & side.flag() != 0
    }

    /// Rectangle this side currently belongs to
    #[inline]
    pub fn face(&self, side: Side) -> Option<RectId> {
        self.faces[side.index()]
    }

    /// Whether this voxel allocated the rectangle its side still points at
    pub fn owns_face(&self, side: Side) -> bool {
        let slot = side.index();
        self.owned[slot].is_some() && self.owned[slot] == self.faces[slot]
    }
}

/// A merged rectangle on one side of a matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixFace {
    pub side: Side,
    /// Anchor voxel in matrix-local coordinates
    pub rect_start: IVec3,
    /// Extent in voxels; the component along the side's axis is always 1
    pub rect_size: IVec3,
    /// World-space corners, wound outward
    pub points: [Vec3; 4],
    /// Color of the anchor voxel
    pub color: Color,
}

impl MatrixFace {
    /// Width and height of the rectangle in its own plane
    ///
    /// Width runs along the column axis, height along the row axis.
    pub fn plane_extent(&self) -> (u32, u32) {
        (
            self.rect_size[self.side.column_axis()] as u32,
            self.rect_size[self.side.row_axis()] as u32,
        )
    }

    /// Local position of the voxel at (`u`, `v`) within the rectangle
    pub fn voxel_at(&self, u: u32, v: u32) -> IVec3 {
        let mut pos = self.rect_start;
        pos[self.side.column_axis()] += u as i32;
        pos[self.side.row_axis()] += v as i32;
        pos
    }
}

/// Inclusive integer bounds of the occupied voxels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: IVec3,
    pub max: IVec3,
}

/// Drawable voxel set and merged faces of one node
#[derive(Debug, Clone)]
pub struct VoxelMatrix {
    pub node: NodeId,
    pub name: String,
    pub full_name: String,
    pub size: IVec3,
    pub world_position: IVec3,
    /// World position plus the node pivot
    pub world_pivot: Vec3,
    pub bounds: Option<Bounds>,
    pub world_center: Vec3,
    pub half_extents: Vec3,
    voxels: Vec<Voxel>,
    occupancy: std::collections::HashMap<IVec3, usize>,
    faces: Vec<MatrixFace>,
}

impl VoxelMatrix {
    /// Build the matrix for node `id` of `scene`
    pub fn build(scene: &VoxelScene, id: NodeId) -> Result<VoxelMatrix, MatrixError> {
        let node = scene.node(id);
        let size = node.size.as_ivec3();
        let world_position = scene.world_position(id);
        let mut merger = FaceMerger::new(&node.full_name);
        let mut bounds: Option<Bounds> = None;

        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    let position = IVec3::new(x, y, z);
                    let color = node.voxel(position).ok_or_else(|| MatrixError::VoxelNotFound {
                        matrix: node.full_name.clone(),
                        position,
                    })?;
                    if color.a <= CORE_ALPHA {
                        continue;
                    }

                    let mut voxel = Voxel::new(color.opaque(), position);
                    for side in Side::ALL {
                        let neighbor_empty = node
                            .voxel(position + side.offset())
                            .map_or(true, |c| c.a == 0);
                        if side.is_boundary(position, size) || neighbor_empty {
                            voxel.visible |= side.flag();
                        }
                    }
                    merger.insert(voxel)?;

                    bounds = Some(match bounds {
                        Some(b) => Bounds {
                            min: b.min.min(position),
                            max: b.max.max(position),
                        },
                        None => Bounds {
                            min: position,
                            max: position,
                        },
                    });
                }
            }
        }

        merger.merge_rows()?;
        let faces = merger.emit(world_position)?;

        let (world_center, half_extents) = match bounds {
            Some(b) => {
                let world_min = (world_position + b.min).as_vec3();
                let world_max = (world_position + b.max).as_vec3();
                let center = (world_max + world_min + Vec3::ONE) * 0.5;
                (center, center - world_min)
            }
            None => (world_position.as_vec3(), Vec3::ZERO),
        };

        tracing::debug!(
            matrix = %node.full_name,
            voxels = merger.voxels.len(),
            faces = faces.len(),
            "built voxel matrix"
        );

        Ok(VoxelMatrix {
            node: id,
            name: node.name.clone(),
            full_name: node.full_name.clone(),
            size,
            world_position,
            world_pivot: world_position.as_vec3() + node.pivot,
            bounds,
            world_center,
            half_extents,
            voxels: merger.voxels,
            occupancy: merger.occupancy,
            faces,
        })
    }

    /// Occupied voxel at a local coordinate
    pub fn voxel(&self, position: IVec3) -> Result<&Voxel, MatrixError> {
        self.occupancy
            .get(&position)
            .map(|&idx| &self.voxels[idx])
            .ok_or_else(|| MatrixError::VoxelNotFound {
                matrix: self.full_name.clone(),
                position,
            })
    }

    pub fn contains(&self, position: IVec3) -> bool {
        self.occupancy.contains_key(&position)
    }

    /// Drawable voxels in (z, y, x) scan order
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn faces(&self) -> &[MatrixFace] {
        &self.faces
    }

    /// True when no voxel is drawable
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}
