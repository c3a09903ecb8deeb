use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// A face found in a frame, in native frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub bounds: Rect,
    pub confidence: f64,
}

impl DetectedFace {
    pub fn new(bounds: Rect, confidence: f64) -> Self {
        Self { bounds, confidence }
    }

    pub fn center(&self) -> (f64, f64) {
        self.bounds.center()
    }
}

/// Domain interface for face detection.
///
/// `load_model` is called once before the first session; `detect_faces` may
/// be called once per round. Both may fail, and callers treat failure as
/// "no faces" rather than aborting the game.
pub trait FaceDetector: Send {
    /// Prepares the detector from a model path or URL.
    fn load_model(&mut self, source: &str) -> Result<(), Box<dyn std::error::Error>>;

    fn detect_faces(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
