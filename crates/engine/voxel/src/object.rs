//! Object types
//!
//! An object type names the parts an asset must have under its `Base` node,
//! its voxel-to-world scale, how its skeleton is centered, and the static
//! pre-rotations applied to specific markers.

use crate::skeleton::SkeletonCentering;
use crate::tree::{NodeId, VoxelScene};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level node holding an asset's geometry
pub const BASE_NODE: &str = "Base";

/// World units per voxel for every built-in type
pub const DEFAULT_VOXEL_SIZE: f32 = 0.0125;

fn default_voxel_size() -> f32 {
    DEFAULT_VOXEL_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    /// Matrices required directly under `Base`
    #[serde(default)]
    pub parts: Vec<String>,
    #[serde(default = "default_voxel_size")]
    pub voxel_size: f32,
    #[serde(default)]
    pub centering: SkeletonCentering,
    /// Euler degrees (X, Y, Z) per marker name
    #[serde(default)]
    pub pre_rotations: BTreeMap<String, [f32; 3]>,
}

impl ObjectType {
    fn new(
        name: &str,
        parts: &[&str],
        centering: SkeletonCentering,
        pre_rotations: &[(&str, [f32; 3])],
    ) -> Self {
        Self {
            name: name.to_string(),
            parts: parts.iter().map(|p| p.to_string()).collect(),
            voxel_size: DEFAULT_VOXEL_SIZE,
            centering,
            pre_rotations: pre_rotations
                .iter()
                .map(|(marker, angles)| (marker.to_string(), *angles))
                .collect(),
        }
    }

    /// Whether every required part is a direct child of `base`
    ///
    /// A type without parts matches any asset, with or without a `Base` node.
    pub fn matches(&self, scene: &VoxelScene, base: Option<NodeId>) -> bool {
        if self.parts.is_empty() {
            return true;
        }
        let Some(base) = base else {
            return false;
        };
        let base = scene.node(base);
        self.parts.iter().all(|part| base.child_id(part).is_some())
    }
}

const HANDLE_ROTATIONS: [(&str, [f32; 3]); 2] = [("HL_Handle", [0.0, -90.0, 0.0]), ("HR_Handle", [0.0, 90.0, 0.0])];

/// Built-in types in detection order; `prop` matches anything and comes last
pub fn builtin_types() -> Vec<ObjectType> {
    use SkeletonCentering::*;

    vec![
        ObjectType::new(
            "biped",
            &[
                "Hips", "L_Thigh", "L_Calf", "L_Heel", "L_Toes", "R_Thigh", "R_Calf", "R_Heel", "R_Toes", "Waist",
                "Chest", "Head", "L_Upperarm", "L_Forearm", "L_Hand", "L_Digit_0", "L_Digit_1", "L_Digit_2",
                "L_Thumb_0", "L_Thumb_1", "R_Upperarm", "R_Forearm", "R_Hand", "R_Digit_0", "R_Digit_1",
                "R_Digit_2", "R_Thumb_0", "R_Thumb_1",
            ],
            ObjectOffset,
            &[
                ("HL_Hand_In", [0.0, 0.0, 90.0]),
                ("HL_Hand_Out", [0.0, 0.0, 90.0]),
                ("HR_Hand_In", [0.0, 0.0, -90.0]),
                ("HR_Hand_Out", [0.0, 0.0, -90.0]),
            ],
        ),
        ObjectType::new("weapon", &["Hold", "Strike"], ObjectOffset, &HANDLE_ROTATIONS),
        ObjectType::new("missile", &["Shaft", "Strike"], RootNullRelative, &[("HNock", [0.0, 0.0, 0.0])]),
        ObjectType::new(
            "quiver",
            &[
                "Quiver", "Arrow_0", "Arrow_1", "Arrow_2", "Arrow_3", "Arrow_4", "Arrow_5", "Arrow_6", "Arrow_7",
            ],
            ObjectOffset,
            &[("HR_Hip", [-30.0, 0.0, 0.0])],
        ),
        ObjectType::new(
            "bow",
            &[
                "Hold", "L_String_0", "L_String_1", "R_String_0", "R_String_1", "L_Seg_0", "L_Seg_1", "L_Seg_2",
                "R_Seg_0", "R_Seg_1", "R_Seg_2",
            ],
            ObjectOffset,
            &HANDLE_ROTATIONS,
        ),
        ObjectType::new("prop", &[], ObjectOffset, &[]),
    ]
}

/// First type in `types` that `scene` satisfies
pub fn detect_type<'a>(types: &'a [ObjectType], scene: &VoxelScene) -> Option<&'a ObjectType> {
    let base = scene.find_top_level(BASE_NODE);
    types.iter().find(|t| t.matches(scene, base))
}
