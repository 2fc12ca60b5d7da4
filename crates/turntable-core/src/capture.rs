//! Shoot constants and per-model capture state.

use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::output::frame_file_name;

/// Number of rotation steps captured per model.
pub const CAPTURE_STEPS: u32 = 16;

/// Width and height of every captured frame, in pixels.
pub const FRAME_SIZE: u32 = 512;

/// File extension of encoded frames.
pub const FRAME_EXTENSION: &str = "png";

/// Degrees between consecutive steps.
pub const STEP_DEGREES: f32 = 360.0 / CAPTURE_STEPS as f32;

/// Turntable rotation (Euler degrees) for `step`.
pub fn step_rotation(step: u32) -> Vec3 {
    Vec3::new(0.0, step as f32 * STEP_DEGREES, 0.0)
}

/// A square RGBA8 pixel buffer read back from a render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first.
    pub pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Creates a buffer filled with `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Returns true if the pixel data matches the dimensions.
    pub fn is_consistent(&self) -> bool {
        self.pixels.len() == (self.width * self.height * 4) as usize
    }
}

/// State for one model's shoot.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    model_name: String,
    output_dir: PathBuf,
    step: u32,
    complete: bool,
}

impl CaptureSession {
    /// Starts a session writing into `output_dir`.
    pub fn new(model_name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_name: model_name.into(),
            output_dir: output_dir.into(),
            step: 0,
            complete: false,
        }
    }

    /// Display name of the model being captured.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Directory frames are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Index of the current step.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Path of the frame for the current step.
    pub fn frame_path(&self) -> PathBuf {
        self.output_dir.join(frame_file_name(self.step, FRAME_EXTENSION))
    }

    /// Moves to the next step. Returns false once every step has been taken.
    pub fn advance(&mut self) -> bool {
        if self.step + 1 < CAPTURE_STEPS {
            self.step += 1;
            true
        } else {
            false
        }
    }

    /// Whether the shoot has finished and the instance was torn down.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Marks the shoot as finished.
    pub fn mark_complete(&mut self) {
        self.complete = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_step_angles() {
        assert_eq!(STEP_DEGREES, 22.5);
        assert_eq!(step_rotation(0), Vec3::ZERO);
        assert_eq!(step_rotation(1), Vec3::new(0.0, 22.5, 0.0));
        assert_eq!(step_rotation(15), Vec3::new(0.0, 337.5, 0.0));
    }

    #[test]
    fn test_session_visits_every_step_once() {
        let mut session = CaptureSession::new("Chair(Clone)", "/out/Chair");
        let mut paths = vec![session.frame_path()];
        while session.advance() {
            paths.push(session.frame_path());
        }
        assert_eq!(paths.len(), CAPTURE_STEPS as usize);
        assert_eq!(paths[0], Path::new("/out/Chair/frame0000.png"));
        assert_eq!(paths[15], Path::new("/out/Chair/frame0015.png"));
        assert!(!session.is_complete());
        session.mark_complete();
        assert!(session.is_complete());
    }

    #[test]
    fn test_filled_frame_buffer() {
        let frame = FrameBuffer::filled(4, 2, [1, 2, 3, 4]);
        assert!(frame.is_consistent());
        assert_eq!(&frame.pixels[4..8], &[1, 2, 3, 4]);
    }

    proptest! {
        #[test]
        fn prop_step_rotation_is_yaw_only(step in 0u32..CAPTURE_STEPS) {
            let r = step_rotation(step);
            prop_assert_eq!(r.x, 0.0);
            prop_assert_eq!(r.z, 0.0);
            prop_assert!((r.y - step as f32 * 22.5).abs() < 1e-4);
            prop_assert!(r.y < 360.0);
        }
    }
}
