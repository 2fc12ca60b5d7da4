//! Where captured frames are written.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::CLONE_SUFFIX;

/// Name of the output directory under the working directory.
pub const OUTPUT_DIR_NAME: &str = "output";

/// Removes every instance suffix from a display name.
///
/// `Chair(Clone)` becomes `Chair`.
pub fn strip_clone_suffix(name: &str) -> String {
    name.replace(CLONE_SUFFIX, "")
}

/// File name for a captured step, e.g. `frame0007.png`.
pub fn frame_file_name(step: u32, extension: &str) -> String {
    format!("frame{step:04}.{extension}")
}

/// Maps model names to per-model output directories under a fixed root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    used: HashSet<String>,
}

impl OutputLayout {
    /// Creates a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            used: HashSet::new(),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for the model with display name `instance_name`.
    pub fn model_dir(&self, instance_name: &str) -> PathBuf {
        self.root.join(strip_clone_suffix(instance_name))
    }

    /// Returns the model's directory, creating it if it does not exist.
    ///
    /// A name already used during this run maps to the same directory, whose
    /// frames will be overwritten; that is logged as a warning.
    pub fn ensure_model_dir(&mut self, instance_name: &str) -> Result<PathBuf> {
        let name = strip_clone_suffix(instance_name);
        if !self.used.insert(name.clone()) {
            log::warn!("model name '{name}' used more than once; its frames will be overwritten");
        }
        let dir = self.root.join(&name);
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            log::debug!("created output directory {}", dir.display());
        }
        Ok(dir)
    }
}
