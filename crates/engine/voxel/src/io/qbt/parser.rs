//! QBT stream parser
//!
//! Reads a complete byte stream into a [`VoxelScene`]. Any validation failure
//! aborts the read; no partial tree is ever returned.

use super::constants::*;
use super::inflate::{InflateFailure, Inflater};
use super::reader::QbtReader;
use super::QbtError;
use crate::tree::{Color, NodeDesc, NodeId, NodeKind, SceneBuilder, VoxelScene};
use std::path::Path;

/// Parse a QBT byte stream, naming the root Model node `root_name`
pub fn parse_qbt(data: &[u8], root_name: &str) -> Result<VoxelScene, QbtError> {
    let mut parser = QbtParser {
        reader: QbtReader::new(data),
        root_name,
        inflater: Inflater::default(),
    };
    parser.parse()
}

/// Read and parse a `.qbt` file; the root is named after the file stem
pub fn load_qbt(path: impl AsRef<Path>) -> Result<VoxelScene, QbtError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| QbtError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_qbt(&data, &root_name)
}

/// Where a node's body starts and how long its header says it is
///
/// The declared length covers the node's fields and its whole subtree.
#[derive(Debug, Clone, Copy)]
struct BodySpan {
    start: usize,
    declared: u32,
}

struct QbtParser<'a> {
    reader: QbtReader<'a>,
    root_name: &'a str,
    inflater: Inflater,
}

impl QbtParser<'_> {
    fn parse(&mut self) -> Result<VoxelScene, QbtError> {
        let magic = self.reader.read_u32_le()?;
        if magic != QBT_MAGIC {
            return Err(QbtError::InvalidMagic {
                expected: QBT_MAGIC,
                found: magic,
            });
        }

        let major = self.reader.read_u8()?;
        let minor = self.reader.read_u8()?;
        if major != VERSION_MAJOR || minor != VERSION_MINOR {
            return Err(QbtError::UnsupportedVersion { major, minor });
        }

        let global_scale = self.reader.read_vec3()?;

        self.reader.expect_caption(COLORMAP_CAPTION)?;
        let color_count = self.reader.read_u32_le()?;
        if color_count > MAX_COLOR_COUNT {
            return Err(QbtError::TooManyColors { count: color_count });
        }
        if color_count > 0 {
            return Err(QbtError::PaletteNotSupported { count: color_count });
        }

        self.reader.expect_caption(DATATREE_CAPTION)?;

        let (root, child_count, body) = self.read_node("")?;
        let mut builder = SceneBuilder::new(root);
        let root_id = builder.root();
        self.read_children(&mut builder, root_id, child_count, 1)?;
        self.note_body_len(builder.full_name(root_id), body);

        let scene = builder.build(global_scale);
        tracing::debug!(
            root = %scene.root().name,
            nodes = scene.len(),
            bytes = self.reader.position(),
            "parsed QBT tree"
        );
        Ok(scene)
    }

    fn read_children(
        &mut self,
        builder: &mut SceneBuilder,
        parent: NodeId,
        count: u32,
        depth: usize,
    ) -> Result<(), QbtError> {
        if count > 0 && depth > MAX_TREE_DEPTH {
            return Err(QbtError::RecursionLimit {
                node: builder.full_name(parent).to_string(),
                max_depth: MAX_TREE_DEPTH,
            });
        }

        for _ in 0..count {
            let parent_path = builder.full_name(parent).to_string();
            let (desc, child_count, body) = self.read_node(&parent_path)?;
            let id = builder.push(parent, desc);
            self.read_children(builder, id, child_count, depth + 1)?;
            self.note_body_len(builder.full_name(id), body);
        }
        Ok(())
    }

    /// Read one node header and body; returns the node and its child count
    fn read_node(&mut self, parent_path: &str) -> Result<(NodeDesc, u32, BodySpan), QbtError> {
        let kind_offset = self.reader.position();
        let kind_id = self.reader.read_u32_le()?;
        let declared = self.reader.read_u32_le()?;
        let body = BodySpan {
            start: self.reader.position(),
            declared,
        };

        let kind = NodeKind::from_id(kind_id).ok_or_else(|| QbtError::UnknownNodeKind {
            kind: kind_id,
            offset: kind_offset,
            parent: parent_path.to_string(),
        })?;

        let (desc, child_count) = match kind {
            NodeKind::Model => {
                let child_count = self.reader.read_u32_le()?;
                (NodeDesc::model(self.root_name), child_count)
            }
            NodeKind::Matrix => (self.read_voxel_node(kind, parent_path)?, 0),
            NodeKind::Compound => {
                let desc = self.read_voxel_node(kind, parent_path)?;
                let child_count = self.reader.read_u32_le()?;
                (desc, child_count)
            }
        };

        tracing::debug!(
            kind = %kind,
            name = %desc.name,
            body_len = body.declared,
            children = child_count,
            "read QBT node"
        );
        Ok((desc, child_count, body))
    }

    /// Compare the declared body length with what the node and its subtree used
    ///
    /// A mismatch is logged and otherwise ignored.
    fn note_body_len(&self, node: &str, body: BodySpan) {
        let consumed = self.reader.position() - body.start;
        if consumed != body.declared as usize {
            tracing::warn!(
                node,
                declared = body.declared,
                consumed,
                offset = body.start,
                "QBT node body length does not match its contents"
            );
        }
    }

    fn read_name(&mut self, kind: NodeKind, parent_path: &str) -> Result<String, QbtError> {
        let offset = self.reader.position();
        let len = self.reader.read_u32_le()?;
        if len > MAX_NAME_LEN {
            return Err(QbtError::NameTooLong {
                len,
                offset,
                parent: parent_path.to_string(),
            });
        }
        if len == 0 {
            return Err(QbtError::EmptyName {
                kind,
                offset,
                parent: parent_path.to_string(),
            });
        }
        let bytes = self.reader.read_bytes(len as usize)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_voxel_node(&mut self, kind: NodeKind, parent_path: &str) -> Result<NodeDesc, QbtError> {
        let name = self.read_name(kind, parent_path)?;
        let node_path = if parent_path.is_empty() {
            name.clone()
        } else {
            format!("{parent_path}-{name}")
        };

        let position = self.reader.read_ivec3()?;
        let local_scale = self.reader.read_uvec3()?;
        let pivot = self.reader.read_vec3()?;
        let size_offset = self.reader.position();
        let size = self.reader.read_uvec3()?;

        let expected = (size.x as usize)
            .checked_mul(size.y as usize)
            .and_then(|n| n.checked_mul(size.z as usize))
            .and_then(|n| n.checked_mul(COLOR_SIZE))
            .ok_or_else(|| QbtError::VoxelCountOverflow {
                node: node_path.clone(),
                offset: size_offset,
                size_x: size.x,
                size_y: size.y,
                size_z: size.z,
            })?;

        let data_len = self.reader.read_u32_le()?;
        let data_offset = self.reader.position();
        let compressed = self.reader.read_bytes(data_len as usize)?;

        let inflated = self
            .inflater
            .inflate(compressed, expected)
            .map_err(|failure| match failure {
                InflateFailure::Corrupt(message) => QbtError::CorruptPayload {
                    node: node_path.clone(),
                    offset: data_offset,
                    message,
                },
                InflateFailure::Truncated => QbtError::TruncatedPayload {
                    node: node_path.clone(),
                    offset: data_offset,
                },
                InflateFailure::Exhausted { attempts, capacity } => QbtError::PayloadTooLarge {
                    node: node_path.clone(),
                    attempts,
                    capacity,
                },
            })?;

        if inflated.len() != expected {
            return Err(QbtError::VoxelCountMismatch {
                node: node_path,
                expected,
                found: inflated.len(),
                size_x: size.x,
                size_y: size.y,
                size_z: size.z,
            });
        }

        let voxels = inflated
            .chunks_exact(COLOR_SIZE)
            .map(|c| Color::from_rgba([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(NodeDesc {
            kind,
            name,
            position,
            local_scale,
            pivot,
            size,
            voxels,
        })
    }
}
