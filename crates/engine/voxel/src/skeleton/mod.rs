//! Skeleton extraction from marker voxels
//!
//! Assets describe bones and hardpoints with small matrices under a top-level
//! node named `Skeleton`. Each matrix name encodes one or more markers (see
//! [`names`]); the matrix pivot gives the marker position.
//!
//! Extraction:
//!
//! 1. Collect raw markers from every Matrix node under `Skeleton`.
//! 2. Find the single root: an `N` marker without a parent.
//! 3. Mirror `?L_` markers to `?R_` about the root's X position.
//! 4. Resolve each marker's transforms, parents first.
//!
//! A missing `Skeleton` node yields an empty skeleton.

pub mod document;
mod error;
pub mod mirror;
pub mod names;

pub use document::{MarkerRecord, SkeletonDocument};
pub use error::SkeletonError;

use crate::matrix::VoxelMatrix;
use crate::tree::{NodeKind, VoxelScene};
use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use names::{end_marker_name, MarkerName, RawKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Name of the top-level node holding marker matrices
pub const SKELETON_NODE: &str = "Skeleton";

/// Bones point down -Z before being aimed at their end marker
pub const BONE_INITIAL_AXIS: Vec3 = Vec3::NEG_Z;

/// Origin the root marker's local transform is taken against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkeletonCentering {
    /// Overall object center
    #[default]
    ObjectOffset,
    /// Root marker position
    RootNullRelative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Null,
    Bone,
    Hardpoint,
}

/// Marker as read from the tree, before kinds and transforms are resolved
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawMarker {
    pub position: Vec3,
    /// Empty when unparented
    pub parent: String,
    /// Empty when unspecified
    pub group: String,
    /// Full name of the node that defined it
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullMarker {
    pub kind: MarkerKind,
    pub name: String,
    pub parent: Option<String>,
    pub group: String,
    /// Voxel-space position
    pub position: Vec3,
    pub end_position: Option<Vec3>,
    pub direction: Vec3,
    pub length: f32,
    pub world_transform: Mat4,
    pub local_transform: Mat4,
    pub children: BTreeSet<String>,
}

impl NullMarker {
    fn new(kind: MarkerKind, name: &str, raw: &RawMarker) -> Self {
        Self {
            kind,
            name: name.to_string(),
            parent: (!raw.parent.is_empty()).then(|| raw.parent.clone()),
            group: raw.group.clone(),
            position: raw.position,
            end_position: None,
            direction: Vec3::ZERO,
            length: 0.0,
            world_transform: Mat4::IDENTITY,
            local_transform: Mat4::IDENTITY,
            children: BTreeSet::new(),
        }
    }

    /// Name without its kind letter
    pub fn short_name(&self) -> &str {
        self.name.get(1..).unwrap_or_default()
    }
}

/// Inputs that come from the object type rather than the asset
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Euler degrees (X, Y, Z) per marker name, applied Z then Y then X
    pub pre_rotations: BTreeMap<String, [f32; 3]>,
    pub centering: SkeletonCentering,
    /// Center of the object geometry, voxel space
    pub object_center: Vec3,
}

impl ExtractOptions {
    fn pre_rotation(&self, name: &str) -> Mat4 {
        self.pre_rotations
            .get(name)
            .map(|&[x, y, z]| pre_rotation_matrix(x, y, z))
            .unwrap_or(Mat4::IDENTITY)
    }
}

/// Rotation for Euler degrees `(x, y, z)`, composed as Rz * Ry * Rx
pub fn pre_rotation_matrix(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_quat(Quat::from_euler(
        EulerRot::ZYX,
        z.to_radians(),
        y.to_radians(),
        x.to_radians(),
    ))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    markers: BTreeMap<String, NullMarker>,
    root: Option<String>,
}

impl Skeleton {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn root(&self) -> Option<&NullMarker> {
        self.markers.get(self.root.as_deref()?)
    }

    pub fn marker(&self, name: &str) -> Option<&NullMarker> {
        self.markers.get(name)
    }

    pub fn markers(&self) -> impl Iterator<Item = &NullMarker> {
        self.markers.values()
    }

    /// Markers depth-first from the root, children in name order
    pub fn depth_first(&self) -> Vec<&NullMarker> {
        let mut out = Vec::with_capacity(self.markers.len());
        let mut stack: Vec<&NullMarker> = self.root().into_iter().collect();
        while let Some(marker) = stack.pop() {
            out.push(marker);
            stack.extend(marker.children.iter().rev().filter_map(|c| self.markers.get(c)));
        }
        out
    }
}

/// Extract the skeleton of `scene`
pub fn extract_skeleton(scene: &VoxelScene, options: &ExtractOptions) -> Result<Skeleton, SkeletonError> {
    let Some(skeleton_id) = scene.find_top_level(SKELETON_NODE) else {
        tracing::debug!(asset = %scene.root().name, "no skeleton node");
        return Ok(Skeleton::empty());
    };

    let mut raw: BTreeMap<String, RawMarker> = BTreeMap::new();
    let mut root: Option<String> = None;

    for id in scene.descendants(skeleton_id) {
        let node = scene.node(id);
        if node.kind != NodeKind::Matrix {
            continue;
        }
        let matrix = VoxelMatrix::build(scene, id)?;
        let segments = names::segments(&node.name).ok_or_else(|| SkeletonError::EmptySegment {
            node: node.full_name.clone(),
        })?;

        for MarkerName { name, parent, group } in segments {
            let Some(kind) = RawKind::of(name) else {
                continue;
            };
            if parent.is_empty() {
                match kind {
                    RawKind::Null => {
                        if let Some(first) = &root {
                            return Err(SkeletonError::MultipleRoots {
                                first: first.clone(),
                                second: name.to_string(),
                            });
                        }
                        root = Some(name.to_string());
                    }
                    RawKind::BoneEnd => {}
                    RawKind::BoneStart | RawKind::Hardpoint => {
                        return Err(SkeletonError::MissingParent {
                            marker: name.to_string(),
                            node: node.full_name.clone(),
                        });
                    }
                }
            }

            let marker = RawMarker {
                position: matrix.world_pivot,
                parent: parent.to_string(),
                group: group.to_string(),
                source: node.full_name.clone(),
            };
            if let Some(existing) = raw.get(name) {
                return Err(SkeletonError::DuplicateMarker {
                    name: name.to_string(),
                    first: existing.source.clone(),
                    second: node.full_name.clone(),
                });
            }
            raw.insert(name.to_string(), marker);
        }
    }

    let root = root.ok_or(SkeletonError::NoRoot)?;
    let mirrored = mirror::mirror_markers(&mut raw, &root);
    if !mirrored.is_empty() {
        tracing::debug!(count = mirrored.len(), "mirrored left-side markers");
    }

    let mut markers = BTreeMap::new();
    for (name, marker) in &raw {
        let kind = match RawKind::of(name) {
            Some(RawKind::Null) => MarkerKind::Null,
            Some(RawKind::BoneStart) => MarkerKind::Bone,
            Some(RawKind::Hardpoint) => MarkerKind::Hardpoint,
            Some(RawKind::BoneEnd) | None => continue,
        };
        markers.insert(name.clone(), NullMarker::new(kind, name, marker));
    }

    let mut resolver = Resolver {
        raw: &raw,
        options,
        root: &root,
        markers,
        state: HashMap::new(),
    };
    let names: Vec<String> = resolver.markers.keys().cloned().collect();
    for name in &names {
        resolver.resolve(name)?;
    }

    tracing::info!(root = %root, markers = resolver.markers.len(), "extracted skeleton");
    Ok(Skeleton {
        markers: resolver.markers,
        root: Some(root),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveState {
    InProgress,
    Done,
}

struct Resolver<'a> {
    raw: &'a BTreeMap<String, RawMarker>,
    options: &'a ExtractOptions,
    root: &'a str,
    markers: BTreeMap<String, NullMarker>,
    state: HashMap<String, ResolveState>,
}

impl Resolver<'_> {
    fn resolve(&mut self, name: &str) -> Result<(), SkeletonError> {
        match self.state.get(name) {
            Some(ResolveState::Done) => return Ok(()),
            Some(ResolveState::InProgress) => {
                return Err(SkeletonError::ParentCycle {
                    marker: name.to_string(),
                })
            }
            None => {}
        }
        self.state.insert(name.to_string(), ResolveState::InProgress);

        let Some(marker) = self.markers.get(name) else {
            return Err(SkeletonError::UnresolvedParent {
                marker: name.to_string(),
                parent: name.to_string(),
            });
        };
        let kind = marker.kind;
        let position = marker.position;
        let parent_name = marker.parent.clone();

        let parent = match &parent_name {
            Some(parent) => {
                if !self.markers.contains_key(parent) {
                    return Err(SkeletonError::UnresolvedParent {
                        marker: name.to_string(),
                        parent: parent.clone(),
                    });
                }
                self.resolve(parent)?;
                self.markers
                    .get(parent)
                    .map(|p| (p.world_transform, p.group.clone()))
            }
            None => None,
        };

        let pre_rotation = self.options.pre_rotation(name);
        let mut end_position = None;
        let mut direction = Vec3::ZERO;
        let mut length = 0.0;

        let world = if kind == MarkerKind::Bone {
            let end_name = end_marker_name(name);
            let end = self
                .raw
                .get(&end_name)
                .ok_or_else(|| SkeletonError::MissingEndMarker {
                    bone: name.to_string(),
                    end: end_name.clone(),
                })?
                .position;
            let span = end - position;
            length = span.length();
            if length <= f32::EPSILON {
                return Err(SkeletonError::DegenerateBone {
                    bone: name.to_string(),
                });
            }
            direction = span / length;
            end_position = Some(end);
            Mat4::from_translation(position)
                * Mat4::from_quat(Quat::from_rotation_arc(BONE_INITIAL_AXIS, direction))
                * pre_rotation
        } else {
            Mat4::from_translation(position) * pre_rotation
        };

        let local = match &parent {
            Some((parent_world, _)) if kind == MarkerKind::Bone => {
                let parent_rotation = Mat3::from_mat4(*parent_world);
                Mat4::from_mat3(parent_rotation.inverse() * Mat3::from_mat4(world))
            }
            Some((parent_world, _)) => parent_world.inverse() * world,
            None => {
                let origin = match self.options.centering {
                    SkeletonCentering::ObjectOffset => self.options.object_center,
                    SkeletonCentering::RootNullRelative => self
                        .markers
                        .get(self.root)
                        .map(|root| root.position)
                        .unwrap_or(position),
                };
                Mat4::from_translation(-origin) * world
            }
        };

        let parent_group = parent.map(|(_, group)| group);
        if let Some(marker) = self.markers.get_mut(name) {
            if marker.group.is_empty() {
                marker.group = parent_group.unwrap_or_else(|| "default".to_string());
            }
            marker.end_position = end_position;
            marker.direction = direction;
            marker.length = length;
            marker.world_transform = world;
            marker.local_transform = local;
        }
        if let Some(parent) = &parent_name {
            if let Some(parent_marker) = self.markers.get_mut(parent) {
                parent_marker.children.insert(name.to_string());
            }
        }

        self.state.insert(name.to_string(), ResolveState::Done);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_rotation_order() {
        // 90 degrees about Z turns +X into +Y
        let m = pre_rotation_matrix(0.0, 0.0, 90.0);
        assert!(m.transform_vector3(Vec3::X).abs_diff_eq(Vec3::Y, 1e-6));

        // Rz * Rx: X applied first
        let m = pre_rotation_matrix(90.0, 0.0, 90.0);
        let expected = Mat4::from_rotation_z(90f32.to_radians()) * Mat4::from_rotation_x(90f32.to_radians());
        assert!(m.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_short_name() {
        let raw = RawMarker {
            position: Vec3::ZERO,
            parent: String::new(),
            group: String::new(),
            source: String::new(),
        };
        let marker = NullMarker::new(MarkerKind::Bone, "BL_Arm", &raw);
        assert_eq!(marker.short_name(), "L_Arm");
        assert_eq!(marker.parent, None);
    }

    #[test]
    fn test_centering_serde_names() {
        let parsed: SkeletonCentering = serde_json::from_str("\"root-null-relative\"").unwrap();
        assert_eq!(parsed, SkeletonCentering::RootNullRelative);
        assert_eq!(
            serde_json::to_string(&SkeletonCentering::ObjectOffset).unwrap(),
            "\"object-offset\""
        );
    }
}
