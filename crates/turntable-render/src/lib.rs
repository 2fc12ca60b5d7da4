//! Rendering backend for turntable.
//!
//! This crate provides the headless wgpu engine the batch renders through:
//! - An orthographic [`Camera`] the framer sizes to each model
//! - GPU upload of a model instance's parts and a lit mesh pipeline
//! - Per-capture render targets with pixel readback
//! - PNG encoding of captured frames

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

pub mod buffer;
pub mod camera;
pub mod engine;
pub mod error;
pub mod mesh_render;
pub mod screenshot;

pub use camera::Camera;
pub use engine::{CameraUniforms, RenderEngine, COLOR_FORMAT, DEPTH_FORMAT};
pub use error::{RenderError, RenderResult};
pub use mesh_render::{MeshVertex, PartRenderData, PartUniforms};
pub use screenshot::{encode_png, ScreenshotError};
