use crate::side::Side;
use glam::IVec3;
use thiserror::Error;

/// Internal consistency failures while building a matrix
///
/// These never come from bad input; they mean the merge bookkeeping lost track
/// of a voxel or rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("voxel {position} missing from '{matrix}'")]
    VoxelNotFound { matrix: String, position: IVec3 },

    #[error("{side} face of voxel {position} in '{matrix}' refers to missing rectangle #{rect}")]
    DanglingRect {
        matrix: String,
        position: IVec3,
        side: Side,
        rect: usize,
    },

    #[error("{side} face of voxel {position} in '{matrix}' is visible but has no rectangle")]
    MissingRect {
        matrix: String,
        position: IVec3,
        side: Side,
    },
}
