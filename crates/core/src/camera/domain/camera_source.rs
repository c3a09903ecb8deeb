use thiserror::Error;

use crate::shared::constants::{CAMERA_IDEAL_HEIGHT, CAMERA_IDEAL_WIDTH};
use crate::shared::frame::Frame;
use crate::shared::stream_metadata::StreamMetadata;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    #[error("no camera available: {0}")]
    Unavailable(String),
    #[error("camera stream metadata unavailable: {0}")]
    Metadata(String),
}

/// What the game asks of a camera: video only, at a preferred size.
/// Sources treat sizes as hints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            ideal_width: CAMERA_IDEAL_WIDTH,
            ideal_height: CAMERA_IDEAL_HEIGHT,
        }
    }
}

/// Acquires live camera streams.
pub trait CameraSource: Send {
    fn acquire(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// A live stream owned by one game session.
///
/// Implementations release hardware in `stop`, which must be safe to call
/// more than once.
pub trait CameraStream: Send {
    fn metadata(&self) -> &StreamMetadata;

    /// Grabs the current frame at native resolution.
    fn snapshot(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints_ask_for_720p() {
        let c = CameraConstraints::default();
        assert_eq!((c.ideal_width, c.ideal_height), (1280, 720));
    }

    #[test]
    fn test_error_messages_name_the_cause() {
        let err = CameraError::PermissionDenied("user dismissed prompt".into());
        assert_eq!(err.to_string(), "camera access denied: user dismissed prompt");
    }
}
