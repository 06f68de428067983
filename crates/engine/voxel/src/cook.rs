//! Asset cooking
//!
//! Turns a parsed [`VoxelScene`] into meshes, a texture atlas and a skeleton
//! document, and writes them out as `<base>.obj`, `<base>.mtl`, `<base>.png`
//! and `<base>.skl`.

use crate::atlas::TextureAtlas;
use crate::config::{ConfigError, CookConfig};
use crate::io::obj::{write_mtl, write_obj};
use crate::io::qbt::{load_qbt, QbtError};
use crate::matrix::{MatrixError, VoxelMatrix};
use crate::mesh::{assemble_meshes, VoxMesh};
use crate::object::{detect_type, ObjectType, BASE_NODE};
use crate::skeleton::document::MeshBounds;
use crate::skeleton::{extract_skeleton, ExtractOptions, Skeleton, SkeletonDocument, SkeletonError, SKELETON_NODE};
use crate::tree::{NodeId, VoxelScene};
use glam::Vec3;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CookError {
    #[error(transparent)]
    Qbt(#[from] QbtError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Skeleton(#[from] SkeletonError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no object type matches '{asset}'")]
    UnknownObjectType { asset: String },

    #[error("'{asset}' has no visible voxels")]
    NoGeometry { asset: String },

    #[error("failed to encode skeleton document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "png")]
    #[error("failed to write atlas {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Everything produced from one scene
#[derive(Debug, Clone)]
pub struct CookedAsset {
    pub name: String,
    /// Detected type with config overrides applied
    pub object_type: ObjectType,
    pub matrices: Vec<VoxelMatrix>,
    pub meshes: Vec<VoxMesh>,
    pub atlas: TextureAtlas,
    pub skeleton: Skeleton,
    /// Center of all geometry, voxel space
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Paths written by [`CookedAsset::write_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookedFiles {
    pub obj: PathBuf,
    pub mtl: PathBuf,
    pub png: Option<PathBuf>,
    pub skeleton: PathBuf,
}

/// Matrix and Compound nodes whose voxels form the asset's geometry
///
/// Everything under `Base` when the asset has one, otherwise every node
/// outside the `Skeleton` subtree. Pre-order.
pub fn geometry_nodes(scene: &VoxelScene) -> Vec<NodeId> {
    let (start, skipped) = match scene.find_top_level(BASE_NODE) {
        Some(base) => (base, Vec::new()),
        None => {
            let skipped = match scene.find_top_level(SKELETON_NODE) {
                Some(skeleton) => {
                    let mut ids = scene.descendants(skeleton);
                    ids.push(skeleton);
                    ids
                }
                None => Vec::new(),
            };
            (scene.root_id(), skipped)
        }
    };

    std::iter::once(start)
        .chain(scene.descendants(start))
        .filter(|id| !skipped.contains(id))
        .filter(|id| scene.node(*id).kind.has_voxels())
        .collect()
}

/// Union of the matrices' bounds as (center, half extents)
fn overall_bounds(matrices: &[VoxelMatrix]) -> (Vec3, Vec3) {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for matrix in matrices {
        min = min.min(matrix.world_center - matrix.half_extents);
        max = max.max(matrix.world_center + matrix.half_extents);
    }
    ((min + max) * 0.5, (max - min) * 0.5)
}

/// Cook `scene` with the object type and overrides from `config`
pub fn cook(scene: &VoxelScene, config: &CookConfig) -> Result<CookedAsset, CookError> {
    let name = scene.root().name.clone();

    let types = config.object_types();
    let object_type = detect_type(&types, scene)
        .map(|detected| config.apply(detected))
        .ok_or_else(|| CookError::UnknownObjectType { asset: name.clone() })?;

    let mut matrices = Vec::new();
    for id in geometry_nodes(scene) {
        let matrix = VoxelMatrix::build(scene, id)?;
        if matrix.is_empty() {
            tracing::debug!(node = %matrix.full_name, "skipping empty matrix");
            continue;
        }
        matrices.push(matrix);
    }
    if matrices.is_empty() {
        return Err(CookError::NoGeometry { asset: name });
    }

    let mut meshes = assemble_meshes(&matrices);
    let atlas = TextureAtlas::build(&matrices)?;
    atlas.apply(&matrices, &mut meshes);

    let (center, half_extents) = overall_bounds(&matrices);

    let options = ExtractOptions {
        pre_rotations: object_type.pre_rotations.clone(),
        centering: object_type.centering,
        object_center: center,
    };
    let skeleton = extract_skeleton(scene, &options)?;
    if skeleton.is_empty() {
        tracing::warn!(asset = %name, "asset has no skeleton");
    }

    tracing::info!(
        asset = %name,
        object_type = %object_type.name,
        meshes = meshes.len(),
        triangles = meshes.iter().map(VoxMesh::triangle_count).sum::<usize>(),
        markers = skeleton.len(),
        atlas_width = atlas.width,
        atlas_height = atlas.height,
        "cooked asset"
    );

    Ok(CookedAsset {
        name,
        object_type,
        matrices,
        meshes,
        atlas,
        skeleton,
        center,
        half_extents,
    })
}

/// Load a `.qbt` file and cook it
pub fn cook_file(path: impl AsRef<Path>, config: &CookConfig) -> Result<CookedAsset, CookError> {
    let scene = load_qbt(path)?;
    cook(&scene, config)
}

fn create(path: &Path) -> Result<BufWriter<File>, CookError> {
    File::create(path).map(BufWriter::new).map_err(|source| CookError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CookError + '_ {
    move |source| CookError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl CookedAsset {
    /// Bounds of each geometry matrix keyed by node name
    pub fn mesh_bounds(&self) -> HashMap<String, MeshBounds> {
        self.matrices
            .iter()
            .map(|m| {
                let bounds = MeshBounds {
                    center: m.world_center,
                    half_extents: m.half_extents,
                };
                (m.name.clone(), bounds)
            })
            .collect()
    }

    pub fn document(&self) -> SkeletonDocument {
        SkeletonDocument::new(
            &self.object_type.name,
            self.object_type.voxel_size,
            self.center,
            self.half_extents,
            &self.skeleton,
            &self.mesh_bounds(),
        )
    }

    pub fn material_name(base: &str) -> String {
        format!("{base}_Material")
    }

    #[cfg(feature = "png")]
    fn write_png(&self, path: &Path) -> Result<(), CookError> {
        self.atlas.save_png(path).map_err(|source| CookError::Image {
            path: path.to_path_buf(),
            source,
        })
    }

    #[cfg(not(feature = "png"))]
    fn write_png(&self, _path: &Path) -> Result<(), CookError> {
        Ok(())
    }

    /// Write all outputs into `out_dir` named after `base`
    ///
    /// The atlas image is only written with the `png` feature.
    pub fn write_files(&self, out_dir: &Path, base: &str) -> Result<CookedFiles, CookError> {
        std::fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;

        let files = CookedFiles {
            obj: out_dir.join(format!("{base}.obj")),
            mtl: out_dir.join(format!("{base}.mtl")),
            png: cfg!(feature = "png").then(|| out_dir.join(format!("{base}.png"))),
            skeleton: out_dir.join(format!("{base}.skl")),
        };
        let material = Self::material_name(base);

        let mut obj = create(&files.obj)?;
        write_obj(
            &mut obj,
            &self.meshes,
            &material,
            &format!("{base}.mtl"),
            self.object_type.voxel_size,
        )
        .and_then(|_| obj.flush())
        .map_err(io_error(&files.obj))?;

        let mut mtl = create(&files.mtl)?;
        write_mtl(&mut mtl, &material, &format!("{base}.png"))
            .and_then(|_| mtl.flush())
            .map_err(io_error(&files.mtl))?;

        if let Some(png) = &files.png {
            self.write_png(png)?;
        }

        let json = self.document().to_json()?;
        std::fs::write(&files.skeleton, json).map_err(io_error(&files.skeleton))?;

        tracing::info!(asset = %self.name, dir = %out_dir.display(), "wrote cooked files");
        Ok(files)
    }
}
