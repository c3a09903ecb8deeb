pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Rounds played per session.
pub const TOTAL_ROUNDS: u32 = 10;

/// Countdown ticks before each capture.
pub const COUNTDOWN_TICKS: u32 = 5;

pub const TICK_INTERVAL_MS: u64 = 1000;

/// Pause after a capture so players can see the result.
pub const RESULT_PAUSE_MS: u64 = 1500;

/// Delay between "ready" and the first round.
pub const READY_DELAY_MS: u64 = 1000;

/// Successful rounds needed for a mission success, regardless of round count.
pub const MISSION_SUCCESS_THRESHOLD: u32 = 3;

pub const MIN_TARGET_PERSONS: u32 = 3;
pub const MAX_TARGET_PERSONS: u32 = 7;

pub const CAMERA_IDEAL_WIDTH: u32 = 1280;
pub const CAMERA_IDEAL_HEIGHT: u32 = 720;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
