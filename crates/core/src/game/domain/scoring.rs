use crate::detection::domain::face_detector::DetectedFace;
use crate::game::domain::box_generator::TargetBox;
use crate::shared::rect::{Rect, ScaleFactors};

/// Outcome of scoring one capture.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundScore {
    /// The target box in native frame coordinates.
    pub native_box: Rect,
    /// Faces whose center fell inside `native_box`.
    pub counted: Vec<DetectedFace>,
    pub success: bool,
}

impl RoundScore {
    pub fn face_count(&self) -> u32 {
        self.counted.len() as u32
    }

    pub fn caption(&self) -> String {
        caption(self.face_count(), self.success)
    }
}

/// Exact match: more faces than asked for is a miss too.
pub fn is_success(detected: u32, target: u32) -> bool {
    detected == target
}

pub fn caption(face_count: u32, success: bool) -> String {
    let status = if success { "SUCCESS!" } else { "FAIL" };
    format!("{face_count} faces detected - {status}")
}

/// Faces whose center lies inside `target` (inclusive bounds).
pub fn faces_in_box(faces: &[DetectedFace], target: &Rect) -> Vec<DetectedFace> {
    faces
        .iter()
        .filter(|f| {
            let (cx, cy) = f.center();
            target.contains_point(cx, cy)
        })
        .cloned()
        .collect()
}

/// Scores a capture: maps the display-space box into native space, counts
/// the faces centered inside it and compares with the target count.
pub fn score_round(
    target_box: &TargetBox,
    to_native: ScaleFactors,
    faces: &[DetectedFace],
    target_person_count: u32,
) -> RoundScore {
    let native_box = target_box.as_rect().scaled(to_native);
    let counted = faces_in_box(faces, &native_box);
    let success = is_success(counted.len() as u32, target_person_count);
    RoundScore {
        native_box,
        counted,
        success,
    }
}
