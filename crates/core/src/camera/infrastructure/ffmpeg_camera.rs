use std::path::PathBuf;
use std::time::Duration;

use crate::camera::domain::camera_source::{
    CameraConstraints, CameraError, CameraSource, CameraStream,
};
use crate::camera::infrastructure::latest_frame::LatestFrameReader;
use crate::shared::frame::Frame;
use crate::shared::stream_metadata::StreamMetadata;

/// How long a snapshot waits for the first decoded frame.
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_FILE_FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[cfg(target_os = "linux")]
const DEVICE_INPUT_FORMAT: &str = "video4linux2";
#[cfg(target_os = "macos")]
const DEVICE_INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const DEVICE_INPUT_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const DEVICE_INPUT_FORMAT: &str = "video4linux2";

/// Where frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CameraInput {
    /// Capture device, e.g. `/dev/video0` or `0` on macOS.
    Device(String),
    /// Video file played back as if it were a camera.
    File(PathBuf),
}

/// Camera source backed by ffmpeg-next (libavdevice + libavcodec).
pub struct FfmpegCamera {
    input: CameraInput,
}

impl FfmpegCamera {
    pub fn new(input: CameraInput) -> Self {
        Self { input }
    }
}

impl CameraSource for FfmpegCamera {
    fn acquire(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        let stream = FfmpegStream::open(&self.input, constraints)?;
        log::info!(
            "Camera {} streaming at {}x{}",
            stream.metadata.device,
            stream.metadata.width,
            stream.metadata.height
        );
        Ok(Box::new(stream))
    }
}

struct Decoding {
    input_ctx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    frame_index: usize,
}

// Safety: after `open` the decoding state is moved to the reader thread and
// only ever touched there. The raw pointers inside ffmpeg types are never
// shared between threads.
unsafe impl Send for Decoding {}

impl Decoding {
    /// Next decoded frame, or `None` once the input is exhausted.
    fn decode_next(&mut self) -> Result<Option<Frame>, String> {
        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }

        loop {
            let next = self.input_ctx.packets().next();
            let Some((stream, packet)) = next else {
                let _ = self.decoder.send_eof();
                return self.try_receive();
            };
            if stream.index() != self.stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, String> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| e.to_string())?;
        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

/// An open ffmpeg input decoding to RGB24 on a background thread.
///
/// Snapshots return the most recently decoded frame. Files are paced at
/// their frame rate and keep returning their last frame once they run out,
/// so a short clip can stand in for a camera for a whole session.
struct FfmpegStream {
    reader: LatestFrameReader,
    metadata: StreamMetadata,
}

impl FfmpegStream {
    fn open(input: &CameraInput, constraints: &CameraConstraints) -> Result<Self, CameraError> {
        ffmpeg_next::init().map_err(|e| CameraError::Unavailable(e.to_string()))?;

        let (input_ctx, device) = match input {
            CameraInput::File(path) => {
                let ctx = ffmpeg_next::format::input(path).map_err(|e| open_error(&e))?;
                (ctx, path.display().to_string())
            }
            CameraInput::Device(name) => (open_device(name, constraints)?, name.clone()),
        };

        let stream = input_ctx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| CameraError::Unavailable(format!("{device}: no video stream")))?;
        let stream_index = stream.index();

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| CameraError::Metadata(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| CameraError::Metadata(e.to_string()))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(CameraError::Metadata(format!(
                "{device}: stream reports no frame size"
            )));
        }

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| CameraError::Metadata(e.to_string()))?;

        let mut decoding = Decoding {
            input_ctx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            frame_index: 0,
        };
        // Devices block on the next frame themselves
        let pace = match input {
            CameraInput::File(_) => Some(file_frame_interval(fps)),
            CameraInput::Device(_) => None,
        };
        let reader =
            LatestFrameReader::spawn(&device, Box::new(move || decoding.decode_next()), pace);

        Ok(Self {
            reader,
            metadata: StreamMetadata {
                width,
                height,
                fps,
                device,
            },
        })
    }
}

impl CameraStream for FfmpegStream {
    fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    fn snapshot(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        self.reader.latest(FIRST_FRAME_TIMEOUT)
    }

    fn stop(&mut self) {
        if self.reader.stop() {
            log::info!("Camera {} released", self.metadata.device);
        }
    }

    fn is_live(&self) -> bool {
        self.reader.is_running()
    }
}

fn file_frame_interval(fps: f64) -> Duration {
    if fps.is_finite() && fps > 0.0 {
        Duration::from_secs_f64(1.0 / fps)
    } else {
        DEFAULT_FILE_FRAME_INTERVAL
    }
}

fn open_device(
    name: &str,
    constraints: &CameraConstraints,
) -> Result<ffmpeg_next::format::context::Input, CameraError> {
    ffmpeg_next::device::register_all();
    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == DEVICE_INPUT_FORMAT)
        .ok_or_else(|| {
            CameraError::Unavailable(format!("ffmpeg built without {DEVICE_INPUT_FORMAT}"))
        })?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set(
        "video_size",
        &format!("{}x{}", constraints.ideal_width, constraints.ideal_height),
    );

    ffmpeg_next::format::open_with(name, &ffmpeg_next::format::Format::Input(format), options)
        .map(|ctx| ctx.input())
        .map_err(|e| open_error(&e))
}

fn open_error(e: &ffmpeg_next::Error) -> CameraError {
    let message = e.to_string();
    if message.contains("Permission denied") {
        CameraError::PermissionDenied(message)
    } else {
        CameraError::Unavailable(message)
    }
}

/// Copies RGB24 rows out of a possibly padded ffmpeg plane.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
