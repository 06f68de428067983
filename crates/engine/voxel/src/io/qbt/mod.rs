//! Qubicle Binary Tree (QBT) reader
//!
//! QBT stores a tree of typed nodes. Matrix and Compound nodes carry a
//! zlib-compressed dense RGBA payload; Model and Compound nodes carry children.
//!
//! # Example
//!
//! ```no_run
//! use voxel::io::qbt::load_qbt;
//!
//! let scene = load_qbt("assets/hero.qbt").unwrap();
//! println!("{} nodes under '{}'", scene.len(), scene.root().name);
//! ```
//!
//! # File Format
//!
//! ```text
//! [Header]
//!   Magic: 'QB 2' (0x32204251, little-endian u32)
//!   Version: u8 major = 1, u8 minor = 0
//!   Global scale: f32 x3
//!
//! [Color map]
//!   Caption: "COLORMAP"
//!   Color count: u32 (must be 0, palettes are rejected)
//!
//! [Data tree]
//!   Caption: "DATATREE"
//!   Root node, children follow depth-first
//!
//! [Node]
//!   Kind: u32 (0 Matrix, 1 Model, 2 Compound)
//!   Body length: u32 (fields plus subtree; mismatches are logged, not fatal)
//!   Matrix/Compound: name (u32 len + bytes), position i32x3, local scale u32x3,
//!                    pivot f32x3, size u32x3, data len u32, zlib data
//!   Model/Compound:  child count u32, children
//! ```

mod inflate;
pub mod parser;
pub mod reader;

pub use parser::{load_qbt, parse_qbt};

use crate::tree::NodeKind;
use std::path::PathBuf;
use thiserror::Error;

pub mod constants {
    /// 'QB 2' read as a little-endian u32
    pub const QBT_MAGIC: u32 = 0x3220_4251;
    pub const VERSION_MAJOR: u8 = 1;
    pub const VERSION_MINOR: u8 = 0;

    pub const COLORMAP_CAPTION: &[u8; 8] = b"COLORMAP";
    pub const DATATREE_CAPTION: &[u8; 8] = b"DATATREE";

    pub const MAX_COLOR_COUNT: u32 = 255;
    pub const MAX_NAME_LEN: u32 = 255;

    /// Bytes per voxel in the inflated payload
    pub const COLOR_SIZE: usize = 4;

    /// Guards against runaway recursion on corrupt child counts
    pub const MAX_TREE_DEPTH: usize = 256;
}

/// Failure class, used by callers that only care about the broad category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QbtErrorKind {
    Format,
    Decompression,
    Io,
}

/// QBT read errors
///
/// Node paths are dash-joined full names; `offset` is the byte offset in the
/// stream where the offending field starts.
#[derive(Debug, Error)]
pub enum QbtError {
    #[error("invalid QBT magic number: expected 0x{expected:08X}, found 0x{found:08X}")]
    InvalidMagic { expected: u32, found: u32 },

    #[error("unsupported QBT version {major}.{minor} (only 1.0 is supported)")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("invalid section caption at offset {offset}: expected {expected:?}, found {found:?}")]
    InvalidCaption {
        expected: &'static str,
        found: String,
        offset: usize,
    },

    #[error("invalid color count {count} (max 255)")]
    TooManyColors { count: u32 },

    #[error("palette-indexed QBT ({count} colors) is not supported")]
    PaletteNotSupported { count: u32 },

    #[error("unknown node kind {kind} at offset {offset} under '{parent}'")]
    UnknownNodeKind {
        kind: u32,
        offset: usize,
        parent: String,
    },

    #[error("{kind} node at offset {offset} under '{parent}' has an empty name")]
    EmptyName {
        kind: NodeKind,
        offset: usize,
        parent: String,
    },

    #[error("node name of length {len} at offset {offset} under '{parent}' exceeds 255 bytes")]
    NameTooLong {
        len: u32,
        offset: usize,
        parent: String,
    },

    #[error("truncated data at offset {offset}: expected {expected_bytes} bytes, only {available_bytes} available")]
    TruncatedData {
        offset: usize,
        expected_bytes: usize,
        available_bytes: usize,
    },

    #[error("matrix '{node}' at offset {offset} declares {size_x}x{size_y}x{size_z} voxels, more than can be addressed")]
    VoxelCountOverflow {
        node: String,
        offset: usize,
        size_x: u32,
        size_y: u32,
        size_z: u32,
    },

    #[error("node tree under '{node}' exceeds max depth {max_depth}")]
    RecursionLimit { node: String, max_depth: usize },

    #[error("corrupt voxel payload in '{node}' at offset {offset}: {message}")]
    CorruptPayload {
        node: String,
        offset: usize,
        message: String,
    },

    #[error("voxel payload in '{node}' at offset {offset} ends before the zlib stream does")]
    TruncatedPayload { node: String, offset: usize },

    #[error("voxel payload in '{node}' still overflows after {attempts} buffer growths ({capacity} bytes)")]
    PayloadTooLarge {
        node: String,
        attempts: u32,
        capacity: usize,
    },

    #[error("voxel payload in '{node}' inflated to {found} bytes, expected {expected} ({size_x}x{size_y}x{size_z} voxels)")]
    VoxelCountMismatch {
        node: String,
        expected: usize,
        found: usize,
        size_x: u32,
        size_y: u32,
        size_z: u32,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl QbtError {
    pub fn kind(&self) -> QbtErrorKind {
        match self {
            QbtError::CorruptPayload { .. }
            | QbtError::TruncatedPayload { .. }
            | QbtError::PayloadTooLarge { .. }
            | QbtError::VoxelCountMismatch { .. } => QbtErrorKind::Decompression,
            QbtError::Io { .. } => QbtErrorKind::Io,
            _ => QbtErrorKind::Format,
        }
    }
}
