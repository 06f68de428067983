//! Greedy face merging over an arena of rectangles
//!
//! Rectangles live in a `Vec<FaceRect>` and voxels refer to them by [`RectId`].
//! Several voxels alias the same rectangle once it has grown over them. The
//! column pass runs while voxels are inserted; the row pass runs once after
//! insertion and redirects absorbed rectangles through a translation map.

use super::error::MatrixError;
use super::{MatrixFace, Voxel};
use crate::side::Side;
use glam::IVec3;
use std::collections::HashMap;

/// Handle of a rectangle in the merge arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RectId(usize);

impl RectId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Axis-aligned face rectangle in matrix-local voxel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRect {
    pub side: Side,
    pub start: IVec3,
    pub size: IVec3,
}

pub(super) struct FaceMerger<'a> {
    matrix: &'a str,
    pub(super) voxels: Vec<Voxel>,
    pub(super) occupancy: HashMap<IVec3, usize>,
    rects: Vec<FaceRect>,
}

impl<'a> FaceMerger<'a> {
    pub(super) fn new(matrix: &'a str) -> Self {
        Self {
            matrix,
            voxels: Vec::new(),
            occupancy: HashMap::new(),
            rects: Vec::new(),
        }
    }

    fn rect(&self, id: RectId, position: IVec3, side: Side) -> Result<&FaceRect, MatrixError> {
        self.rects.get(id.0).ok_or_else(|| MatrixError::DanglingRect {
            matrix: self.matrix.to_string(),
            position,
            side,
            rect: id.0,
        })
    }

    fn rect_mut(&mut self, id: RectId, position: IVec3, side: Side) -> Result<&mut FaceRect, MatrixError> {
        let matrix = self.matrix;
        self.rects.get_mut(id.0).ok_or_else(|| MatrixError::DanglingRect {
            matrix: matrix.to_string(),
            position,
            side,
            rect: id.0,
        })
    }

    fn alloc(&mut self, side: Side, start: IVec3) -> RectId {
        let id = RectId(self.rects.len());
        self.rects.push(FaceRect {
            side,
            start,
            size: IVec3::ONE,
        });
        id
    }

    /// Insert a voxel whose visibility mask is already set, column-merging each
    /// visible face into the previous voxel's rectangle where possible
    pub(super) fn insert(&mut self, mut voxel: Voxel) -> Result<(), MatrixError> {
        for side in Side::ALL {
            if voxel.is_visible(side) {
                let rect = match self.column_target(&voxel, side)? {
                    Some(rect) => rect,
                    None => {
                        let rect = self.alloc(side, voxel.position);
                        voxel.owned[side.index()] = Some(rect);
                        rect
                    }
                };
                voxel.faces[side.index()] = Some(rect);
            }
        }

        self.occupancy.insert(voxel.position, self.voxels.len());
        self.voxels.push(voxel);
        Ok(())
    }

    /// Grow the rectangle of the previous voxel along the column axis, if allowed
    fn column_target(&mut self, voxel: &Voxel, side: Side) -> Result<Option<RectId>, MatrixError> {
        let column = side.column_axis();
        if voxel.position[column] <= 0 {
            return Ok(None);
        }

        let prev_pos = voxel.position - IVec3::AXES[column];
        let Some(&prev_idx) = self.occupancy.get(&prev_pos) else {
            return Ok(None);
        };
        let prev = &self.voxels[prev_idx];
        if !prev.is_visible(side) {
            return Ok(None);
        }

        let prev_rect = prev.faces[side.index()].ok_or_else(|| MatrixError::MissingRect {
            matrix: self.matrix.to_string(),
            position: prev_pos,
            side,
        })?;

        let rect = self.rect_mut(prev_rect, prev_pos, side)?;
        // Rectangles already grown by a row merge are capped
        if rect.size[side.row_axis()] != 1 {
            return Ok(None);
        }
        rect.size[column] += 1;
        Ok(Some(prev_rect))
    }

    /// Second pass: fold each rectangle into the one directly below it in the
    /// row direction when their column spans match exactly
    pub(super) fn merge_rows(&mut self) -> Result<(), MatrixError> {
        let mut translation: HashMap<RectId, RectId> = HashMap::new();

        for idx in 0..self.voxels.len() {
            let position = self.voxels[idx].position;
            for side in Side::ALL {
                let slot = side.index();
                let Some(current) = self.voxels[idx].faces[slot] else {
                    continue;
                };

                if let Some(&target) = translation.get(&current) {
                    self.voxels[idx].faces[slot] = Some(target);
                    continue;
                }

                let row = side.row_axis();
                if position[row] <= 0 {
                    continue;
                }
                let prev_pos = position - IVec3::AXES[row];
                let Some(&prev_idx) = self.occupancy.get(&prev_pos) else {
                    continue;
                };
                let Some(prev_rect) = self.voxels[prev_idx].faces[slot] else {
                    continue;
                };
                if prev_rect == current {
                    continue;
                }

                let column = side.column_axis();
                let cur = *self.rect(current, position, side)?;
                let prev = self.rect(prev_rect, prev_pos, side)?;
                if prev.start[column] != cur.start[column] || prev.size[column] != cur.size[column] {
                    continue;
                }

                self.rect_mut(prev_rect, prev_pos, side)?.size[row] += 1;
                translation.insert(current, prev_rect);
                self.voxels[idx].faces[slot] = Some(prev_rect);
            }
        }

        tracing::trace!(
            matrix = self.matrix,
            absorbed = translation.len(),
            "row merge complete"
        );
        Ok(())
    }

    /// One face per rectangle still owned by the voxel that allocated it
    pub(super) fn emit(&self, world_position: IVec3) -> Result<Vec<MatrixFace>, MatrixError> {
        let mut faces = Vec::new();
        for voxel in &self.voxels {
            for side in Side::ALL {
                let slot = side.index();
                let Some(owned) = voxel.owned[slot] else {
                    continue;
                };
                if voxel.faces[slot] != Some(owned) {
                    continue;
                }

                let rect = self.rect(owned, voxel.position, side)?;
                let points = rect
                    .side
                    .corners(rect.start, rect.size)
                    .map(|corner| (world_position + corner).as_vec3());
                faces.push(MatrixFace {
                    side,
                    rect_start: rect.start,
                    rect_size: rect.size,
                    points,
                    color: voxel.color,
                });
            }
        }
        Ok(faces)
    }
}
