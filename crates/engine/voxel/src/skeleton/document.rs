//! Serialized skeleton (`.skl`) document
//!
//! ```json
//! {
//!   "objectType": "weapon",
//!   "voxelSize": 0.0125,
//!   "center": [0.0, 0.1, 0.0],
//!   "halfExtents": [0.05, 0.1, 0.05],
//!   "skeleton": [
//!     { "name": "N_Root", "type": "null", "parent": null, ... },
//!     { "name": "BL_Arm", "type": "bone", "parent": "N_Root", ... }
//!   ]
//! }
//! ```
//!
//! Positions and translations are multiplied by `voxelSize`. Transforms are
//! four rows: the three basis columns, then the translation.

use super::{MarkerKind, NullMarker, Skeleton};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Center and half extents of a mesh, voxel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub center: Vec3,
    pub half_extents: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    pub name: String,
    pub short_name: String,
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    pub parent: Option<String>,
    pub group: String,
    pub pos: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_pos: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_center: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_half_extents: Option<[f32; 3]>,
    pub world_transform: [[f32; 3]; 4],
    pub local_transform: [[f32; 3]; 4],
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkeletonDocument {
    pub object_type: String,
    pub voxel_size: f32,
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    pub skeleton: Vec<MarkerRecord>,
}

/// Transform rows with the translation scaled to world units
pub fn transform_rows(transform: &Mat4, voxel_size: f32) -> [[f32; 3]; 4] {
    [
        transform.x_axis.truncate().to_array(),
        transform.y_axis.truncate().to_array(),
        transform.z_axis.truncate().to_array(),
        (transform.w_axis.truncate() * voxel_size).to_array(),
    ]
}

impl MarkerRecord {
    /// Bones pick up the bounds of the mesh named by their short name
    pub fn from_marker(marker: &NullMarker, voxel_size: f32, meshes: &HashMap<String, MeshBounds>) -> Self {
        let is_bone = marker.kind == MarkerKind::Bone;
        let mesh = is_bone.then(|| meshes.get(marker.short_name())).flatten();

        Self {
            name: marker.name.clone(),
            short_name: marker.short_name().to_string(),
            kind: marker.kind,
            parent: marker.parent.clone(),
            group: marker.group.clone(),
            pos: (marker.position * voxel_size).to_array(),
            end_pos: marker.end_position.map(|p| (p * voxel_size).to_array()),
            dir: is_bone.then(|| marker.direction.to_array()),
            length: is_bone.then_some(marker.length * voxel_size),
            mesh_center: mesh.map(|m| (m.center * voxel_size).to_array()),
            mesh_half_extents: mesh.map(|m| (m.half_extents * voxel_size).to_array()),
            world_transform: transform_rows(&marker.world_transform, voxel_size),
            local_transform: transform_rows(&marker.local_transform, voxel_size),
            children: marker.children.iter().cloned().collect(),
        }
    }
}

impl SkeletonDocument {
    /// Depth-first document for `skeleton`; `center` and `half_extents` are voxel space
    pub fn new(
        object_type: &str,
        voxel_size: f32,
        center: Vec3,
        half_extents: Vec3,
        skeleton: &Skeleton,
        meshes: &HashMap<String, MeshBounds>,
    ) -> Self {
        Self {
            object_type: object_type.to_string(),
            voxel_size,
            center: (center * voxel_size).to_array(),
            half_extents: (half_extents * voxel_size).to_array(),
            skeleton: skeleton
                .depth_first()
                .into_iter()
                .map(|marker| MarkerRecord::from_marker(marker, voxel_size, meshes))
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
