//! Asset references and the asset source contract.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::model::ModelPrefab;

/// A reference to a model asset on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetReference {
    path: PathBuf,
}

impl AssetReference {
    /// Creates a reference to the asset at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the referenced asset.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name of the asset: its file stem, or the whole path if it has none.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map_or_else(|| self.path.display().to_string(), |s| s.to_string_lossy().into_owned())
    }

    /// Resolves a relative reference against `base`.
    #[must_use]
    pub fn resolved_against(&self, base: &Path) -> Self {
        if self.path.is_absolute() {
            self.clone()
        } else {
            Self::new(base.join(&self.path))
        }
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Decodes a referenced asset into a prefab.
///
/// Implementations block and are run off the scheduling thread by the
/// asset store.
pub trait AssetSource: Send + Sync + 'static {
    /// Loads the asset behind `reference`.
    fn load(&self, reference: &AssetReference) -> Result<ModelPrefab, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_file_stem() {
        assert_eq!(AssetReference::new("models/Chair.obj").name(), "Chair");
        assert_eq!(AssetReference::new("Lamp").name(), "Lamp");
    }

    #[test]
    fn test_resolved_against() {
        let base = Path::new("/data/catalog");
        let rel = AssetReference::new("chair.obj").resolved_against(base);
        assert_eq!(rel.path(), Path::new("/data/catalog/chair.obj"));

        let abs = AssetReference::new("/models/lamp.obj").resolved_against(base);
        assert_eq!(abs.path(), Path::new("/models/lamp.obj"));
    }
}
