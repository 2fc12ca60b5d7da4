//! Batch configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::output::OUTPUT_DIR_NAME;

/// What the batch does when a model fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoadFailurePolicy {
    /// Log the failure and continue with the next model.
    #[default]
    Skip,
    /// Stop the batch.
    Abort,
}

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Directory per-model output directories are created under.
    pub output_root: PathBuf,

    /// Behavior on load failure.
    pub load_failure_policy: LoadFailurePolicy,

    /// Maximum frame writes in flight before capture waits.
    pub max_pending_writes: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(OUTPUT_DIR_NAME),
            load_failure_policy: LoadFailurePolicy::Skip,
            max_pending_writes: 8,
        }
    }
}

impl BatchOptions {
    /// Default options rooted at `<current working directory>/output`.
    pub fn in_working_dir() -> Result<Self> {
        Ok(Self {
            output_root: std::env::current_dir()?.join(OUTPUT_DIR_NAME),
            ..Default::default()
        })
    }

    /// Sets the output root.
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Sets the load failure policy.
    #[must_use]
    pub fn with_load_failure_policy(mut self, policy: LoadFailurePolicy) -> Self {
        self.load_failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BatchOptions::default();
        assert_eq!(options.load_failure_policy, LoadFailurePolicy::Skip);
        assert_eq!(options.max_pending_writes, 8);
        assert!(options.output_root.ends_with("output"));
    }

    #[test]
    fn test_serde_roundtrip_keeps_policy() {
        let options = BatchOptions::default().with_load_failure_policy(LoadFailurePolicy::Abort);
        let json = serde_json::to_string(&options).unwrap();
        let back: BatchOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.load_failure_policy, LoadFailurePolicy::Abort);
    }
}
