//! Qubicle QBT import
//!
//! Reads `.qbt` voxel trees, merges each matrix's visible voxel faces into
//! rectangles, assembles the rectangles into named quad meshes and extracts
//! the marker skeleton encoded in node names.
//!
//! ```no_run
//! use voxel::{cook_file, CookConfig};
//!
//! let cooked = cook_file("hero.qbt", &CookConfig::default())?;
//! cooked.write_files("out".as_ref(), "hero")?;
//! # Ok::<(), voxel::CookError>(())
//! ```

pub mod atlas;
pub mod config;
pub mod cook;
pub mod io;
pub mod matrix;
pub mod mesh;
pub mod object;
pub mod side;
pub mod skeleton;
pub mod tree;

pub use atlas::TextureAtlas;
pub use config::{ConfigError, CookConfig};
pub use cook::{cook, cook_file, CookError, CookedAsset, CookedFiles};
pub use io::qbt::{load_qbt, parse_qbt, QbtError, QbtErrorKind};
pub use matrix::{MatrixError, MatrixFace, VoxelMatrix};
pub use mesh::{assemble_meshes, MeshBuilder, TriangleMeshBuilder, VoxMesh, VoxPoly};
pub use object::{builtin_types, detect_type, ObjectType};
pub use side::Side;
pub use skeleton::{extract_skeleton, ExtractOptions, NullMarker, Skeleton, SkeletonCentering, SkeletonError};
pub use tree::{Color, NodeId, NodeKind, VoxelScene};

// Re-export glam for convenience
pub use glam;
