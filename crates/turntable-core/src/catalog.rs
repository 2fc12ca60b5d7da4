//! The ordered list of models a batch processes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asset::AssetReference;
use crate::error::{Result, TurntableError};
use crate::output::strip_clone_suffix;

/// On-disk catalog manifest.
///
/// ```json
/// { "models": ["chair.obj", "lamp/lamp.obj"] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Model paths, relative to the manifest's directory unless absolute.
    pub models: Vec<AssetReference>,
}

/// An ordered, immutable sequence of model references.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: Vec<AssetReference>,
}

impl ModelCatalog {
    /// Creates a catalog from references in capture order.
    pub fn new(entries: Vec<AssetReference>) -> Self {
        Self { entries }
    }

    /// Reads a JSON manifest, resolving relative paths against its directory.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let manifest: CatalogManifest = serde_json::from_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        log::debug!(
            "read {} model(s) from manifest {}",
            manifest.models.len(),
            path.display()
        );
        Ok(Self::new(
            manifest
                .models
                .iter()
                .map(|r| r.resolved_against(base))
                .collect(),
        ))
    }

    /// Appends the entries of `other`.
    pub fn extend(&mut self, other: ModelCatalog) {
        self.entries.extend(other.entries);
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The reference at `index`.
    pub fn reference_at(&self, index: usize) -> Option<&AssetReference> {
        self.entries.get(index)
    }

    /// All references in order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetReference> {
        self.entries.iter()
    }

    /// Checks that the catalog can be processed.
    ///
    /// The catalog must be non-empty and every entry must name a file whose
    /// model name is still non-empty once instance suffixes are removed.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(TurntableError::EmptyCatalog);
        }
        for (index, reference) in self.entries.iter().enumerate() {
            if reference.path().as_os_str().is_empty() {
                return Err(TurntableError::MalformedCatalog {
                    index,
                    reason: "empty path".into(),
                });
            }
            if reference.path().file_name().is_none() {
                return Err(TurntableError::MalformedCatalog {
                    index,
                    reason: format!("'{reference}' does not name a file"),
                });
            }
            if strip_clone_suffix(&reference.name()).trim().is_empty() {
                return Err(TurntableError::MalformedCatalog {
                    index,
                    reason: format!("'{reference}' has an empty model name"),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<AssetReference> for ModelCatalog {
    fn from_iter<I: IntoIterator<Item = AssetReference>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
