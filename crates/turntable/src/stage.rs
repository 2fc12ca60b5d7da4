//! The scene and camera the batch drives.

use pollster::FutureExt;

use turntable_core::{FrameBuffer, OrthographicCamera, Result, Scene, TurntableError};
use turntable_render::RenderEngine;

/// Rendering and scene collaborator of the capture sequence.
///
/// The camera is reached through [`Stage::rig`] together with the scene, so
/// the framer can move the turntable pivot and size the camera in one step.
pub trait Stage {
    /// The scene.
    fn scene(&self) -> &Scene;

    /// The scene, mutably.
    fn scene_mut(&mut self) -> &mut Scene;

    /// The scene and the orthographic camera looking at it.
    fn rig(&mut self) -> (&mut Scene, &mut dyn OrthographicCamera);

    /// Renders the current state of the scene as one frame.
    fn end_of_frame(&mut self) -> Result<()>;

    /// Renders the scene into a fresh `width` x `height` target and reads
    /// its pixels back.
    fn capture(&mut self, width: u32, height: u32) -> Result<FrameBuffer>;
}

/// Renders a frame and yields to the scheduler.
pub async fn end_of_frame<S: Stage + ?Sized>(stage: &mut S) -> Result<()> {
    stage.end_of_frame()?;
    tokio::task::yield_now().await;
    Ok(())
}

/// Yields to the scheduler until the next frame.
pub async fn next_frame() {
    tokio::task::yield_now().await;
}

/// A [`Stage`] backed by the headless wgpu engine.
pub struct HeadlessStage {
    engine: RenderEngine,
    scene: Scene,
    uploaded_generation: u64,
}

impl HeadlessStage {
    /// Wraps an existing engine.
    pub fn new(engine: RenderEngine) -> Self {
        Self {
            engine,
            scene: Scene::default(),
            uploaded_generation: 0,
        }
    }

    /// Creates a headless engine with a `width` x `height` view and wraps it.
    pub fn create(width: u32, height: u32) -> Result<Self> {
        let engine = RenderEngine::new_headless(width, height)
            .block_on()
            .map_err(|e| {
                TurntableError::Render(format!("Failed to create headless engine: {e}"))
            })?;
        Ok(Self::new(engine))
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    /// Brings the GPU copy of the scene up to date.
    fn sync(&mut self) {
        if self.scene.generation() != self.uploaded_generation {
            match self.scene.active() {
                Some(instance) => self.engine.upload_instance(instance),
                None => self.engine.clear_meshes(),
            }
            self.uploaded_generation = self.scene.generation();
        }
        self.engine.set_turntable(&self.scene.turntable);
    }
}

impl Stage for HeadlessStage {
    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn rig(&mut self) -> (&mut Scene, &mut dyn OrthographicCamera) {
        (&mut self.scene, &mut self.engine.camera)
    }

    fn end_of_frame(&mut self) -> Result<()> {
        self.sync();
        self.engine.render();
        Ok(())
    }

    fn capture(&mut self, width: u32, height: u32) -> Result<FrameBuffer> {
        self.sync();
        self.engine
            .capture_frame(width, height)
            .map_err(|e| TurntableError::Render(e.to_string()))
    }
}
