//! Shared helpers: in-memory QBT streams and hand-built scenes
//!
//! Included by the other test files with `mod test_scenes;`.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use glam::{IVec3, UVec3, Vec3};
use std::io::Write;
use voxel::tree::{Color, NodeDesc, SceneBuilder};
use voxel::VoxelScene;

pub const QBT_MAGIC: u32 = 0x3220_4251;
pub const RED: [u8; 4] = [255, 0, 0, 255];

/// Node as written to a test stream
pub enum TestNode {
    Model(Vec<TestNode>),
    Matrix(TestMatrix),
    Compound(TestMatrix, Vec<TestNode>),
    /// Arbitrary kind id with an empty body
    Raw(u32),
}

pub struct TestMatrix {
    pub name: String,
    pub position: IVec3,
    pub pivot: Vec3,
    pub size: UVec3,
    /// RGBA per voxel in stream order
    pub voxels: Vec<[u8; 4]>,
    /// Replaces the compressed payload when set
    pub payload: Option<Vec<u8>>,
}

impl TestMatrix {
    /// Matrix filled by `color(x, y, z)`, pivot at the center
    pub fn filled(name: &str, size: UVec3, color: impl Fn(u32, u32, u32) -> [u8; 4]) -> Self {
        Self {
            name: name.to_string(),
            position: IVec3::ZERO,
            pivot: size.as_vec3() * 0.5,
            size,
            voxels: dense(size, color),
            payload: None,
        }
    }

    pub fn solid(name: &str, size: UVec3, rgba: [u8; 4]) -> Self {
        Self::filled(name, size, |_, _, _| rgba)
    }

    pub fn at(mut self, position: IVec3) -> Self {
        self.position = position;
        self
    }
}

/// Dense payload in stream order: x slowest, then z, then y
pub fn dense(size: UVec3, color: impl Fn(u32, u32, u32) -> [u8; 4]) -> Vec<[u8; 4]> {
    let mut out = Vec::with_capacity((size.x * size.y * size.z) as usize);
    for x in 0..size.x {
        for z in 0..size.z {
            for y in 0..size.y {
                out.push(color(x, y, z));
            }
        }
    }
    out
}

pub fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Header up to and including the color count
pub fn header(out: &mut Vec<u8>, color_count: u32) {
    put_u32(out, QBT_MAGIC);
    out.extend_from_slice(&[1, 0]);
    for _ in 0..3 {
        put_f32(out, 1.0);
    }
    out.extend_from_slice(b"COLORMAP");
    put_u32(out, color_count);
}

fn matrix_body(out: &mut Vec<u8>, m: &TestMatrix) {
    put_u32(out, m.name.len() as u32);
    out.extend_from_slice(m.name.as_bytes());
    for v in m.position.to_array() {
        put_i32(out, v);
    }
    for _ in 0..3 {
        put_u32(out, 1);
    }
    for v in m.pivot.to_array() {
        put_f32(out, v);
    }
    for v in m.size.to_array() {
        put_u32(out, v);
    }
    let payload = match &m.payload {
        Some(payload) => payload.clone(),
        None => zlib(&m.voxels.concat()),
    };
    put_u32(out, payload.len() as u32);
    out.extend_from_slice(&payload);
}

fn children(out: &mut Vec<u8>, nodes: &[TestNode]) {
    put_u32(out, nodes.len() as u32);
    for child in nodes {
        node(out, child);
    }
}

pub fn node(out: &mut Vec<u8>, node: &TestNode) {
    let mut body = Vec::new();
    let kind = match node {
        TestNode::Model(nodes) => {
            children(&mut body, nodes);
            1
        }
        TestNode::Matrix(m) => {
            matrix_body(&mut body, m);
            0
        }
        TestNode::Compound(m, nodes) => {
            matrix_body(&mut body, m);
            children(&mut body, nodes);
            2
        }
        TestNode::Raw(kind) => *kind,
    };
    put_u32(out, kind);
    put_u32(out, body.len() as u32);
    out.extend_from_slice(&body);
}

/// Complete stream for `root`
pub fn encode_qbt(root: &TestNode) -> Vec<u8> {
    let mut out = Vec::new();
    header(&mut out, 0);
    out.extend_from_slice(b"DATATREE");
    node(&mut out, root);
    out
}

/// Model with a single 1x1x1 red "Body" matrix
pub fn red_cube_stream() -> Vec<u8> {
    encode_qbt(&TestNode::Model(vec![TestNode::Matrix(TestMatrix::solid(
        "Body",
        UVec3::ONE,
        RED,
    ))]))
}

/// Single voxel marker node with its pivot at `position`
pub fn marker(name: &str, position: IVec3) -> NodeDesc {
    NodeDesc::matrix(name, position, UVec3::ONE, vec![Color::new(0, 255, 0, 255)])
}

/// Scene with a "Body" cube and a "Skeleton" holding one node per marker name
pub fn skeleton_scene(markers: &[(&str, IVec3)]) -> VoxelScene {
    let mut builder = SceneBuilder::new(NodeDesc::model("rig"));
    let root = builder.root();
    builder.push(
        root,
        NodeDesc::matrix("Body", IVec3::ZERO, UVec3::ONE, vec![Color::new(255, 0, 0, 255)]),
    );
    let skeleton = builder.push(root, NodeDesc::compound("Skeleton", IVec3::ZERO, UVec3::ZERO, vec![]));
    for (name, position) in markers {
        builder.push(skeleton, marker(name, *position));
    }
    builder.build(Vec3::ONE)
}
