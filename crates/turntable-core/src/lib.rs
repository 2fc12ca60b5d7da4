//! Core types for turntable-rs.
//!
//! This crate holds everything about a turntable shoot that does not touch the
//! GPU or the async runtime:
//! - [`ModelCatalog`] and [`AssetReference`], the batch input
//! - [`ModelPrefab`] / [`ModelInstance`] and the single-instance [`Scene`]
//! - [`CameraFramer`], which fits an orthographic camera to a model
//! - [`OutputLayout`] and the capture constants that name every frame

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Step indices and pixel counts are small
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

pub mod asset;
pub mod bounds;
pub mod capture;
pub mod catalog;
pub mod error;
pub mod framing;
pub mod model;
pub mod options;
pub mod output;
pub mod scene;

pub use asset::{AssetReference, AssetSource};
pub use bounds::Aabb;
pub use capture::{
    step_rotation, CaptureSession, FrameBuffer, CAPTURE_STEPS, FRAME_EXTENSION, FRAME_SIZE,
    STEP_DEGREES,
};
pub use catalog::{CatalogManifest, ModelCatalog};
pub use error::{LoadError, Result, TurntableError};
pub use framing::{CameraFramer, Framing, OrthographicCamera, FRAMING_PADDING};
pub use model::{Mesh, ModelInstance, ModelPrefab, PrefabNode, RenderablePart, CLONE_SUFFIX};
pub use options::{BatchOptions, LoadFailurePolicy};
pub use output::{frame_file_name, strip_clone_suffix, OutputLayout, OUTPUT_DIR_NAME};
pub use scene::{Scene, Turntable};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec3};
