//! The per-model shoot.
//!
//! A shoot frames the active instance once, then for each of the
//! [`CAPTURE_STEPS`] steps waits a frame, rotates the turntable, waits for the
//! rotation to be drawn, captures and encodes a frame, and hands it to the
//! [`FrameWriter`]. The instance is destroyed when the last frame is queued.

use std::path::PathBuf;

use glam::Vec3;

use turntable_core::{
    step_rotation, CameraFramer, CaptureSession, OutputLayout, Result, TurntableError,
    CAPTURE_STEPS, FRAME_SIZE,
};
use turntable_render::encode_png;

use crate::stage::{end_of_frame, next_frame, Stage};
use crate::writer::FrameWriter;

/// Where a shoot currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// Not started.
    Idle,
    /// Creating the output directory and fitting the camera.
    Framing,
    /// Waiting for the previous frame to finish.
    Settle { step: u32 },
    /// Setting the turntable angle for `step`.
    Rotate { step: u32 },
    /// Waiting for the rotation to be drawn.
    WaitFrame { step: u32 },
    /// Rendering into a capture target and encoding the pixels.
    Capture { step: u32 },
    /// Queueing the encoded frame.
    Write { step: u32 },
    /// Destroying the instance.
    TearDown,
    /// Finished.
    Done,
}

/// What a finished shoot produced.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// Name of the captured instance.
    pub model_name: String,
    /// Directory the frames were written to.
    pub output_dir: PathBuf,
    /// Frame paths in step order.
    pub frames: Vec<PathBuf>,
}

/// Drives one model through its shoot.
#[derive(Debug)]
pub struct CaptureSequencer {
    phase: CapturePhase,
    session: Option<CaptureSession>,
    encoded: Option<Vec<u8>>,
    frames: Vec<PathBuf>,
    frame_size: u32,
}

impl Default for CaptureSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSequencer {
    /// Creates an idle sequencer capturing [`FRAME_SIZE`] square frames.
    pub fn new() -> Self {
        Self {
            phase: CapturePhase::Idle,
            session: None,
            encoded: None,
            frames: Vec::with_capacity(CAPTURE_STEPS as usize),
            frame_size: FRAME_SIZE,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Runs the shoot for the stage's active instance to completion.
    ///
    /// Resolves once the last frame has been queued and the instance
    /// destroyed. Queued writes may still be in flight; drain the writer to
    /// wait for them.
    pub async fn run<S: Stage + ?Sized>(
        mut self,
        stage: &mut S,
        layout: &mut OutputLayout,
        writer: &mut FrameWriter,
    ) -> Result<CaptureReport> {
        while self.phase != CapturePhase::Done {
            self.phase = self.step(stage, layout, writer).await?;
            log::trace!("capture phase {:?}", self.phase);
        }

        let session = self.session.ok_or(TurntableError::NoActiveInstance)?;
        Ok(CaptureReport {
            model_name: session.model_name().to_string(),
            output_dir: session.output_dir().to_path_buf(),
            frames: self.frames,
        })
    }

    async fn step<S: Stage + ?Sized>(
        &mut self,
        stage: &mut S,
        layout: &mut OutputLayout,
        writer: &mut FrameWriter,
    ) -> Result<CapturePhase> {
        let next = match self.phase {
            CapturePhase::Idle => CapturePhase::Framing,
            CapturePhase::Framing => {
                self.frame(stage, layout)?;
                CapturePhase::Settle { step: 0 }
            }
            CapturePhase::Settle { step } => {
                end_of_frame(stage).await?;
                CapturePhase::Rotate { step }
            }
            CapturePhase::Rotate { step } => {
                stage.scene_mut().turntable.rotation = step_rotation(step);
                CapturePhase::WaitFrame { step }
            }
            CapturePhase::WaitFrame { step } => {
                end_of_frame(stage).await?;
                CapturePhase::Capture { step }
            }
            CapturePhase::Capture { step } => {
                let frame = stage.capture(self.frame_size, self.frame_size)?;
                let bytes = encode_png(&frame).map_err(|e| TurntableError::Encode(e.to_string()))?;
                self.encoded = Some(bytes);
                CapturePhase::Write { step }
            }
            CapturePhase::Write { step } => {
                let session = self.session.as_mut().ok_or(TurntableError::NoActiveInstance)?;
                let path = session.frame_path();
                let bytes = self
                    .encoded
                    .take()
                    .ok_or_else(|| TurntableError::Encode(format!("no frame for step {step}")))?;
                writer.write(bytes, path.clone()).await?;
                self.frames.push(path);

                let more = session.advance();
                next_frame().await;
                if more {
                    CapturePhase::Settle { step: step + 1 }
                } else {
                    CapturePhase::TearDown
                }
            }
            CapturePhase::TearDown => {
                stage.scene_mut().despawn();
                if let Some(session) = self.session.as_mut() {
                    session.mark_complete();
                    log::info!(
                        "captured {} frames of {}",
                        self.frames.len(),
                        session.model_name()
                    );
                }
                CapturePhase::Done
            }
            CapturePhase::Done => CapturePhase::Done,
        };
        Ok(next)
    }

    /// Creates the output directory and fits the camera to the instance.
    fn frame<S: Stage + ?Sized>(&mut self, stage: &mut S, layout: &mut OutputLayout) -> Result<()> {
        let (scene, camera) = stage.rig();
        let instance = scene.active().ok_or(TurntableError::NoActiveInstance)?;
        let name = instance.name().to_string();
        let output_dir = layout.ensure_model_dir(&name)?;

        let mut turntable = scene.turntable;
        turntable.rotation = Vec3::ZERO;
        CameraFramer::frame(camera, &mut turntable, instance);
        scene.turntable = turntable;

        log::debug!("shooting {name} into {}", output_dir.display());
        self.session = Some(CaptureSession::new(name, output_dir));
        Ok(())
    }
}
