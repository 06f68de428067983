use crate::object::{builtin_types, ObjectType};
use crate::skeleton::SkeletonCentering;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Cook settings loaded from a TOML file
///
/// Every field is optional; an empty file cooks with the built-in object types.
///
/// ```toml
/// voxel_size = 0.025
/// centering = "root-null-relative"
///
/// [pre_rotations]
/// HR_Hip = [-45.0, 0.0, 0.0]
///
/// [[object_types]]
/// name = "shield"
/// parts = ["Board", "Grip"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CookConfig {
    /// Overrides the detected type's voxel size
    pub voxel_size: Option<f32>,
    /// Overrides the detected type's centering
    pub centering: Option<SkeletonCentering>,
    /// Merged over the detected type's pre-rotations
    pub pre_rotations: BTreeMap<String, [f32; 3]>,
    /// Checked before the built-in types
    pub object_types: Vec<ObjectType>,
}

impl CookConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<CookConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Configured types followed by the built-ins
    pub fn object_types(&self) -> Vec<ObjectType> {
        let mut types = self.object_types.clone();
        types.extend(builtin_types());
        types
    }

    /// `object_type` with this config's overrides applied
    pub fn apply(&self, object_type: &ObjectType) -> ObjectType {
        let mut resolved = object_type.clone();
        if let Some(voxel_size) = self.voxel_size {
            resolved.voxel_size = voxel_size;
        }
        if let Some(centering) = self.centering {
            resolved.centering = centering;
        }
        resolved
            .pre_rotations
            .extend(self.pre_rotations.iter().map(|(k, v)| (k.clone(), *v)));
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::DEFAULT_VOXEL_SIZE;

    #[test]
    fn test_empty_config() {
        let config: CookConfig = toml::from_str("").unwrap();
        assert!(config.voxel_size.is_none());
        assert!(config.object_types.is_empty());
        assert_eq!(config.object_types().last().map(|t| t.name.as_str()), Some("prop"));
    }

    #[test]
    fn test_overrides() {
        let config: CookConfig = toml::from_str(
            r#"
            voxel_size = 0.5
            centering = "root-null-relative"

            [pre_rotations]
            HR_Hip = [-45.0, 0.0, 0.0]

            [[object_types]]
            name = "shield"
            parts = ["Board", "Grip"]
            "#,
        )
        .unwrap();

        assert_eq!(config.object_types[0].name, "shield");
        assert_eq!(config.object_types[0].voxel_size, DEFAULT_VOXEL_SIZE);
        assert_eq!(config.object_types()[0].name, "shield");

        let quiver = builtin_types().into_iter().find(|t| t.name == "quiver").unwrap();
        let resolved = config.apply(&quiver);
        assert_eq!(resolved.voxel_size, 0.5);
        assert_eq!(resolved.centering, SkeletonCentering::RootNullRelative);
        assert_eq!(resolved.pre_rotations["HR_Hip"], [-45.0, 0.0, 0.0]);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cook.toml");
        std::fs::write(&path, "voxel_size = \"big\"").unwrap();

        match CookConfig::load(&path).unwrap_err() {
            ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected Parse, got {other:?}"),
        }
    }
}
