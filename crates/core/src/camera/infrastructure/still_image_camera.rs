use std::path::PathBuf;

use crate::camera::domain::camera_source::{
    CameraConstraints, CameraError, CameraSource, CameraStream,
};
use crate::shared::frame::Frame;
use crate::shared::stream_metadata::StreamMetadata;

/// Serves a single image file as every frame of a stream.
///
/// Useful for rehearsing a game against a group photo, and for running
/// without capture hardware.
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CameraSource for StillImageCamera {
    fn acquire(
        &mut self,
        _constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        let img = image::open(&self.path)
            .map_err(|e| CameraError::Unavailable(format!("{}: {e}", self.path.display())))?
            .to_rgb8();
        if img.width() == 0 || img.height() == 0 {
            return Err(CameraError::Metadata(format!(
                "{}: empty image",
                self.path.display()
            )));
        }

        let metadata = StreamMetadata {
            width: img.width(),
            height: img.height(),
            fps: 0.0,
            device: self.path.display().to_string(),
        };
        Ok(Box::new(StillImageStream {
            frame: Some(Frame::from_rgb_image(img, 0)),
            metadata,
            snapshots: 0,
        }))
    }
}

struct StillImageStream {
    frame: Option<Frame>,
    metadata: StreamMetadata,
    snapshots: usize,
}

impl CameraStream for StillImageStream {
    fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    fn snapshot(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        let frame = self.frame.as_ref().ok_or("camera stream stopped")?;
        let snapshot = Frame::new(
            frame.data().to_vec(),
            frame.width(),
            frame.height(),
            frame.channels(),
            self.snapshots,
        );
        self.snapshots += 1;
        Ok(snapshot)
    }

    fn stop(&mut self) {
        self.frame = None;
    }

    fn is_live(&self) -> bool {
        self.frame.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("group.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_acquire_reports_image_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 120, 80);
        let stream = StillImageCamera::new(path)
            .acquire(&CameraConstraints::default())
            .unwrap();
        assert_eq!(stream.metadata().width, 120);
        assert_eq!(stream.metadata().height, 80);
        assert!(stream.is_live());
    }

    #[test]
    fn test_snapshots_repeat_the_image_with_increasing_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 20, 10);
        let mut stream = StillImageCamera::new(path)
            .acquire(&CameraConstraints::default())
            .unwrap();

        let first = stream.snapshot().unwrap();
        let second = stream.snapshot().unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(&first.data()[..3], &[50, 100, 200]);
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn test_stop_is_idempotent_and_ends_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 20, 10);
        let mut stream = StillImageCamera::new(path)
            .acquire(&CameraConstraints::default())
            .unwrap();

        stream.stop();
        stream.stop();
        assert!(!stream.is_live());
        assert!(stream.snapshot().is_err());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let mut camera = StillImageCamera::new(PathBuf::from("/nonexistent/group.png"));
        let result = camera.acquire(&CameraConstraints::default());
        assert!(matches!(result, Err(CameraError::Unavailable(_))));
    }
}
