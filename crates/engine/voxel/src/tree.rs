//! In-memory voxel scene tree
//!
//! A [`VoxelScene`] owns every [`VoxelTreeNode`] in a flat arena. Nodes refer to
//! their parent and children through [`NodeId`] handles into that arena, so the
//! tree stays read-only and free of back-pointers once built.

use glam::{IVec3, UVec3, Vec3};
use std::collections::HashMap;

/// RGBA voxel color as stored in the QBT payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Fully transparent, used for atlas padding
    pub const CLEAR: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from four payload bytes in R, G, B, A order
    #[inline]
    pub fn from_rgba(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with alpha forced to 255
    #[inline]
    pub fn opaque(self) -> Self {
        Self { a: 255, ..self }
    }

    /// Normalized RGB in 0-1 range
    pub fn to_rgb_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Node kind tag as encoded in the data tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Matrix,
    Model,
    Compound,
}

impl NodeKind {
    /// Decode the on-disk kind id
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(NodeKind::Matrix),
            1 => Some(NodeKind::Model),
            2 => Some(NodeKind::Compound),
            _ => None,
        }
    }

    /// Matrix and Compound nodes carry a voxel payload
    #[inline]
    pub fn has_voxels(self) -> bool {
        !matches!(self, NodeKind::Model)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Matrix => "matrix",
            NodeKind::Model => "model",
            NodeKind::Compound => "compound",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle of a node inside its owning [`VoxelScene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Everything the reader knows about a node before it is linked into the tree
#[derive(Debug, Clone)]
pub struct NodeDesc {
    pub kind: NodeKind,
    pub name: String,
    pub position: IVec3,
    pub local_scale: UVec3,
    pub pivot: Vec3,
    pub size: UVec3,
    pub voxels: Vec<Color>,
}

impl NodeDesc {
    /// Model node: no payload, named by the caller
    pub fn model(name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Model,
            name: name.into(),
            position: IVec3::ZERO,
            local_scale: UVec3::ONE,
            pivot: Vec3::ZERO,
            size: UVec3::ZERO,
            voxels: Vec::new(),
        }
    }

    /// Matrix node at `position` with a dense voxel payload
    ///
    /// The pivot defaults to the matrix center.
    pub fn matrix(name: impl Into<String>, position: IVec3, size: UVec3, voxels: Vec<Color>) -> Self {
        Self {
            kind: NodeKind::Matrix,
            name: name.into(),
            position,
            local_scale: UVec3::ONE,
            pivot: size.as_vec3() * 0.5,
            size,
            voxels,
        }
    }

    /// Compound node: payload plus children
    pub fn compound(name: impl Into<String>, position: IVec3, size: UVec3, voxels: Vec<Color>) -> Self {
        Self {
            kind: NodeKind::Compound,
            ..Self::matrix(name, position, size, voxels)
        }
    }
}

/// One node of the imported tree
#[derive(Debug, Clone)]
pub struct VoxelTreeNode {
    pub kind: NodeKind,
    pub name: String,
    /// Dash-joined chain of ancestor names down to this node
    pub full_name: String,
    pub parent: Option<NodeId>,
    /// Offset relative to the parent, in voxels
    pub position: IVec3,
    pub local_scale: UVec3,
    pub pivot: Vec3,
    pub size: UVec3,
    /// Dense payload indexed by [`VoxelTreeNode::voxel_index`]
    pub voxels: Vec<Color>,
    pub children: Vec<NodeId>,
    child_by_name: HashMap<String, NodeId>,
}

impl VoxelTreeNode {
    /// Index into `voxels` for a coordinate, `None` when outside `size`
    ///
    /// Layout is x-major then z then y: `x*size.z*size.y + z*size.y + y`.
    #[inline]
    pub fn voxel_index(&self, x: u32, y: u32, z: u32) -> Option<usize> {
        if x >= self.size.x || y >= self.size.y || z >= self.size.z {
            return None;
        }
        let idx = x as usize * self.size.z as usize * self.size.y as usize
            + z as usize * self.size.y as usize
            + y as usize;
        (idx < self.voxels.len()).then_some(idx)
    }

    /// Payload color at a signed coordinate, `None` when outside the matrix
    #[inline]
    pub fn voxel(&self, pos: IVec3) -> Option<Color> {
        if pos.cmplt(IVec3::ZERO).any() {
            return None;
        }
        let pos = pos.as_uvec3();
        self.voxel_index(pos.x, pos.y, pos.z)
            .map(|idx| self.voxels[idx])
    }

    /// Direct child registered under `name`
    pub fn child_id(&self, name: &str) -> Option<NodeId> {
        self.child_by_name.get(name).copied()
    }

    pub fn voxel_count(&self) -> usize {
        self.size.x as usize * self.size.y as usize * self.size.z as usize
    }
}

/// Arena builder used by the reader and by hand-built scenes in tests
#[derive(Debug)]
pub struct SceneBuilder {
    nodes: Vec<VoxelTreeNode>,
}

impl SceneBuilder {
    /// Start a tree with `root` as its top node
    pub fn new(root: NodeDesc) -> Self {
        let mut builder = Self { nodes: Vec::new() };
        builder.insert(None, root);
        builder
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Full name of an already inserted node
    pub fn full_name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].full_name
    }

    /// Link `desc` under `parent` and return its handle
    ///
    /// The child is registered in the parent's name map unless the parent is
    /// anonymous. A later sibling with the same name replaces the earlier entry
    /// in the map but both stay in `children`.
    pub fn push(&mut self, parent: NodeId, desc: NodeDesc) -> NodeId {
        self.insert(Some(parent), desc)
    }

    fn insert(&mut self, parent: Option<NodeId>, desc: NodeDesc) -> NodeId {
        let id = NodeId(self.nodes.len());

        let full_name = match (desc.kind, parent) {
            (NodeKind::Model, _) | (_, None) => desc.name.clone(),
            (_, Some(parent)) => format!("{}-{}", self.nodes[parent.0].full_name, desc.name),
        };

        self.nodes.push(VoxelTreeNode {
            kind: desc.kind,
            name: desc.name,
            full_name,
            parent,
            position: desc.position,
            local_scale: desc.local_scale,
            pivot: desc.pivot,
            size: desc.size,
            voxels: desc.voxels,
            children: Vec::new(),
            child_by_name: HashMap::new(),
        });

        if let Some(parent) = parent {
            let child_name = self.nodes[id.0].name.clone();
            let parent_node = &mut self.nodes[parent.0];
            parent_node.children.push(id);
            if !parent_node.name.is_empty() {
                parent_node.child_by_name.insert(child_name, id);
            }
        }

        id
    }

    pub fn build(self, global_scale: Vec3) -> VoxelScene {
        VoxelScene {
            global_scale,
            nodes: self.nodes,
        }
    }
}

/// Fully materialized import tree
#[derive(Debug, Clone)]
pub struct VoxelScene {
    /// Global scale from the file header, kept but not applied
    pub global_scale: Vec3,
    nodes: Vec<VoxelTreeNode>,
}

impl VoxelScene {
    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> &VoxelTreeNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &VoxelTreeNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[VoxelTreeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct child of the root with the given name
    pub fn find_top_level(&self, name: &str) -> Option<NodeId> {
        self.root().child_id(name)
    }

    /// Node position plus the positions of all its ancestors
    pub fn world_position(&self, id: NodeId) -> IVec3 {
        let mut pos = IVec3::ZERO;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current.0];
            pos += node.position;
            cursor = node.parent;
        }
        pos
    }

    /// All nodes below `id` in pre-order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    /// Depth of a node below the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.nodes[id.0].parent;
        while let Some(current) = cursor {
            depth += 1;
            cursor = self.nodes[current.0].parent;
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(size: UVec3, color: Color) -> Vec<Color> {
        vec![color; (size.x * size.y * size.z) as usize]
    }

    #[test]
    fn test_full_names_and_lookup() {
        let mut builder = SceneBuilder::new(NodeDesc::model("hero"));
        let root = builder.root();
        let base = builder.push(root, NodeDesc::compound("Base", IVec3::ZERO, UVec3::ZERO, vec![]));
        let arm = builder.push(
            base,
            NodeDesc::matrix("Arm", IVec3::new(1, 2, 3), UVec3::ONE, solid(UVec3::ONE, Color::new(1, 2, 3, 255))),
        );
        let scene = builder.build(Vec3::ONE);

        assert_eq!(scene.node(arm).full_name, "hero-Base-Arm");
        assert_eq!(scene.find_top_level("Base"), Some(base));
        assert_eq!(scene.node(base).child_id("Arm"), Some(arm));
        assert_eq!(scene.descendants(root), vec![base, arm]);
        assert_eq!(scene.depth(arm), 2);
    }

    #[test]
    fn test_anonymous_parent_skips_registration() {
        let mut builder = SceneBuilder::new(NodeDesc::model(""));
        let root = builder.root();
        let child = builder.push(root, NodeDesc::matrix("Body", IVec3::ZERO, UVec3::ONE, vec![Color::CLEAR]));
        let scene = builder.build(Vec3::ONE);

        assert_eq!(scene.root().children, vec![child]);
        assert_eq!(scene.find_top_level("Body"), None);
    }

    #[test]
    fn test_world_position_sums_ancestors() {
        let mut builder = SceneBuilder::new(NodeDesc::model("m"));
        let root = builder.root();
        let outer = builder.push(root, NodeDesc::compound("Outer", IVec3::new(10, 0, 0), UVec3::ZERO, vec![]));
        let inner = builder.push(outer, NodeDesc::matrix("Inner", IVec3::new(1, 2, 3), UVec3::ZERO, vec![]));
        let scene = builder.build(Vec3::ONE);

        assert_eq!(scene.world_position(inner), IVec3::new(11, 2, 3));
    }

    #[test]
    fn test_voxel_index_layout() {
        let size = UVec3::new(2, 3, 4);
        let voxels = (0..24u8).map(|i| Color::new(i, 0, 0, 255)).collect();
        let scene = SceneBuilder::new(NodeDesc::matrix("m", IVec3::ZERO, size, voxels)).build(Vec3::ONE);
        let node = scene.root();

        // x-major, then z, then y
        assert_eq!(node.voxel_index(1, 2, 3), Some(12 + 9 + 2));
        assert_eq!(node.voxel(IVec3::new(0, 1, 0)).map(|c| c.r), Some(1));
        assert_eq!(node.voxel(IVec3::new(0, 0, 1)).map(|c| c.r), Some(3));
        assert_eq!(node.voxel(IVec3::new(2, 0, 0)), None);
        assert_eq!(node.voxel(IVec3::new(-1, 0, 0)), None);
    }
}
