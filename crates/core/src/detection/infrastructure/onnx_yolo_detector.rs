/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Handles model resolution, letterbox preprocessing, inference and NMS
/// post-processing. Detections come back in native frame coordinates.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectedFace, FaceDetector};
use crate::detection::infrastructure::model_resolver;
use crate::shared::constants::FACE_MODEL_NAME;
use crate::shared::frame::Frame;
use crate::shared::rect::{FrameSize, Rect};

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

/// Output row prefix: `[cx, cy, w, h, conf]`, optionally followed by keypoints.
const BOX_VALUES: usize = 5;

struct LoadedModel {
    session: ort::session::Session,
    input_size: u32,
}

/// YOLO face detector backed by an ONNX Runtime session.
///
/// The session is created by [`FaceDetector::load_model`]; detecting before
/// a successful load is an error.
pub struct OnnxYoloDetector {
    model: Option<LoadedModel>,
    confidence: f64,
}

impl OnnxYoloDetector {
    pub fn new(confidence: f64) -> Self {
        Self {
            model: None,
            confidence,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    fn load_from_file(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        // NCHW: [1, 3, H, W]; dynamic shapes report -1
        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Face model loaded from {} (input {input_size}px)",
            model_path.display()
        );
        self.model = Some(LoadedModel {
            session,
            input_size,
        });
        Ok(())
    }
}

impl Default for OnnxYoloDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE)
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn load_model(&mut self, source: &str) -> Result<(), Box<dyn std::error::Error>> {
        let model_path = model_resolver::resolve_source(source, FACE_MODEL_NAME, None)?;
        self.load_from_file(&model_path)
    }

    fn detect_faces(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let model = self.model.as_mut().ok_or("face model not loaded")?;
        if frame.channels() != 3 || frame.width() == 0 || frame.height() == 0 {
            return Err("face detection needs a non-empty RGB frame".into());
        }

        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, model.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = model.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected face model output shape: {shape:?}").into());
        }

        // [1, features, detections] is the usual (transposed) export layout
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < BOX_VALUES {
            return Err(format!("face model rows too short: {num_feats} values").into());
        }

        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let value = |det: usize, feat: usize| -> f64 {
            if transposed {
                data[feat * num_dets + det] as f64
            } else {
                data[det * num_feats + feat] as f64
            }
        };

        let frame_size = FrameSize::new(frame.width() as f64, frame.height() as f64);
        let mut raw = Vec::new();
        for i in 0..num_dets {
            let conf = value(i, 4);
            if conf < self.confidence {
                continue;
            }
            let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));

            // Letterbox coords back to the native frame
            let x1 = ((cx - w / 2.0) - pad_x as f64) / scale;
            let y1 = ((cy - h / 2.0) - pad_y as f64) / scale;
            let x2 = ((cx + w / 2.0) - pad_x as f64) / scale;
            let y2 = ((cy + h / 2.0) - pad_y as f64) / scale;

            let bounds = Rect::from_corners(x1, y1, x2, y2).clamped_to(frame_size);
            if bounds.area() > 0.0 {
                raw.push(DetectedFace::new(bounds, conf));
            }
        }

        Ok(nms(raw, NMS_IOU_THRESH))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Pad value 114/255 gray, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbour resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

/// Greedy NMS: highest confidence first, drop anything overlapping a kept face.
fn nms(mut faces: Vec<DetectedFace>, iou_thresh: f64) -> Vec<DetectedFace> {
    faces.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<DetectedFace> = Vec::with_capacity(faces.len());
    for face in faces {
        if kept.iter().all(|k| k.bounds.iou(&face.bounds) <= iou_thresh) {
            kept.push(face);
        }
    }
    kept
}
