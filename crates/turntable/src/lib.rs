//! turntable: batch turntable photography of 3D models.
//!
//! Each model in a catalog is loaded, centered on a turntable, and
//! photographed with an orthographic camera from 16 evenly spaced angles.
//! Frames land in `<output>/<model>/frame0000.png` … `frame0015.png`.
//!
//! # Quick Start
//!
//! ```no_run
//! use turntable::*;
//!
//! fn main() -> Result<()> {
//!     let catalog: ModelCatalog = ["models/Chair.obj", "models/Lamp.obj"]
//!         .into_iter()
//!         .map(AssetReference::new)
//!         .collect();
//!
//!     let report = run_batch(catalog, BatchOptions::in_working_dir()?)?;
//!     assert!(report.is_success());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`BatchOrchestrator`] walks the catalog and owns the frame writer
//! - [`ModelLoader`] swaps the scene's single instance for the next model
//! - [`CaptureSequencer`] frames the instance and shoots its 16 steps
//! - [`FrameWriter`] persists encoded frames on the blocking pool
//! - [`Stage`] is the scene and camera everything above drives; the
//!   [`HeadlessStage`] renders it with wgpu

#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod assets;
mod loader;
mod orchestrator;
mod sequencer;
mod stage;
mod writer;

// Re-export core types
pub use turntable_core::{
    AssetReference, AssetSource, BatchOptions, CameraFramer, CaptureSession, FrameBuffer,
    LoadError, LoadFailurePolicy, Mesh, ModelCatalog, ModelInstance, ModelPrefab,
    OrthographicCamera, PrefabNode, Result, Scene, Turntable, TurntableError, CAPTURE_STEPS,
    FRAME_SIZE, Mat4, Quat, Vec3,
};

// Re-export render types
pub use turntable_render::{encode_png, Camera, RenderEngine};

pub use assets::{AssetStore, LoadHandle, LoadedAsset, ObjSource};
pub use loader::ModelLoader;
pub use orchestrator::{BatchOrchestrator, BatchReport, ModelReport, SkippedModel};
pub use sequencer::{CapturePhase, CaptureReport, CaptureSequencer};
pub use stage::{end_of_frame, next_frame, HeadlessStage, Stage};
pub use writer::{FrameWriter, WriteFailure, WriteSummary};

/// Captures every model in `catalog` from OBJ files with the headless
/// renderer.
///
/// Blocks until every frame is on disk. The batch runs on a single-threaded
/// tokio runtime; asset decoding and file writes use its blocking pool.
pub fn run_batch(catalog: ModelCatalog, options: BatchOptions) -> Result<BatchReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut stage = HeadlessStage::create(FRAME_SIZE, FRAME_SIZE)?;
    let mut orchestrator = BatchOrchestrator::new(catalog, options, AssetStore::new(ObjSource));
    runtime.block_on(orchestrator.run(&mut stage))
}
