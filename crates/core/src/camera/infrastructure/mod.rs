pub mod ffmpeg_camera;
mod latest_frame;
pub mod still_image_camera;
