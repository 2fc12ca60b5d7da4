//! Error types for turntable-rs.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for turntable-rs operations.
#[derive(Error, Debug)]
pub enum TurntableError {
    /// The catalog has no entries.
    #[error("model catalog is empty - nothing to capture")]
    EmptyCatalog,

    /// A catalog entry cannot be used.
    #[error("catalog entry {index} is malformed: {reason}")]
    MalformedCatalog { index: usize, reason: String },

    /// A model was spawned while another instance was still alive.
    #[error("instance '{0}' is still active")]
    InstanceStillActive(String),

    /// An operation required an active instance but the scene is empty.
    #[error("no active model instance")]
    NoActiveInstance,

    /// An asset could not be loaded.
    #[error("failed to load '{reference}': {source}")]
    Load {
        reference: String,
        #[source]
        source: LoadError,
    },

    /// Rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// Image encoding error.
    #[error("encode error: {0}")]
    Encode(String),

    /// The frame write queue no longer accepts work.
    #[error("frame write queue closed")]
    WriteQueueClosed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by an asset source or the asset store.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The requested catalog index does not exist.
    #[error("catalog index {index} out of range (catalog has {count} entries)")]
    OutOfRange { index: usize, count: usize },

    /// The asset file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The asset file was read but could not be parsed.
    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The asset parsed but contains no renderable geometry.
    #[error("{0} contains no renderable geometry")]
    EmptyModel(PathBuf),

    /// The background load task did not finish.
    #[error("load task failed: {0}")]
    TaskFailed(String),
}

/// A specialized Result type for turntable-rs operations.
pub type Result<T> = std::result::Result<T, TurntableError>;
