use crate::shared::rect::FrameSize;

/// What a camera stream reports once its metadata has loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub device: String,
}

impl StreamMetadata {
    pub fn native_size(&self) -> FrameSize {
        FrameSize::new(self.width as f64, self.height as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_size() {
        let meta = StreamMetadata {
            width: 1280,
            height: 720,
            fps: 30.0,
            device: "/dev/video0".to_string(),
        };
        assert_eq!(meta.native_size(), FrameSize::new(1280.0, 720.0));
    }
}
