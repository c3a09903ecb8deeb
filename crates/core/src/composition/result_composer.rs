use std::io::Cursor;
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect as PixelRect;
use thiserror::Error;

use crate::detection::domain::face_detector::DetectedFace;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 4;
const FACE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const FACE_THICKNESS: u32 = 3;
const SUCCESS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const FAIL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CAPTION_PX: f32 = 40.0;
const CAPTION_ORIGIN: (i32, i32) = (20, 14);
const BANNER_HEIGHT: u32 = 8;

/// DejaVu Sans Bold, see `assets/DejaVuSans-LICENSE.txt`.
static DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("snapshot is not an RGB frame")]
    NotRgb,
    #[error("failed to encode result image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to read font {path}: {source}")]
    FontRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font file {0}")]
    FontInvalid(String),
}

/// What to draw on top of a snapshot.
pub struct Overlay<'a> {
    pub target_box: &'a Rect,
    pub counted_faces: &'a [DetectedFace],
    pub caption: &'a str,
    pub success: bool,
}

/// Draws the round result over a snapshot and encodes it as PNG.
///
/// A status bar in the result color runs along the top edge with the
/// caption drawn below it, in the bundled font unless another is given.
pub struct ResultComposer {
    font: Option<FontArc>,
}

impl ResultComposer {
    pub fn new() -> Self {
        let font = FontArc::try_from_slice(DEFAULT_FONT).ok();
        if font.is_none() {
            log::warn!("Bundled caption font is unreadable; result photos will have no caption");
        }
        Self { font }
    }

    pub fn with_font_file(path: &Path) -> Result<Self, ComposeError> {
        let bytes = std::fs::read(path).map_err(|source| ComposeError::FontRead {
            path: path.display().to_string(),
            source,
        })?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|_| ComposeError::FontInvalid(path.display().to_string()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn compose(&self, snapshot: &Frame, overlay: &Overlay<'_>) -> Result<Vec<u8>, ComposeError> {
        let mut img = snapshot.to_rgb_image().ok_or(ComposeError::NotRgb)?;

        draw_outline(&mut img, overlay.target_box, BOX_COLOR, BOX_THICKNESS);
        for face in overlay.counted_faces {
            draw_outline(&mut img, &face.bounds, FACE_COLOR, FACE_THICKNESS);
        }

        let status_color = if overlay.success {
            SUCCESS_COLOR
        } else {
            FAIL_COLOR
        };
        let (img_w, img_h) = img.dimensions();
        let banner_h = BANNER_HEIGHT.min(img_h);
        if img_w > 0 && banner_h > 0 {
            draw_filled_rect_mut(
                &mut img,
                PixelRect::at(0, 0).of_size(img_w, banner_h),
                status_color,
            );
        }
        if let Some(font) = &self.font {
            draw_text_mut(
                &mut img,
                status_color,
                CAPTION_ORIGIN.0,
                CAPTION_ORIGIN.1,
                PxScale::from(CAPTION_PX),
                font,
                overlay.caption,
            );
        }

        encode_png(&img)
    }

    /// Encodes the bare snapshot, used when overlay drawing fails.
    pub fn encode_plain(&self, snapshot: &Frame) -> Result<Vec<u8>, ComposeError> {
        let img = snapshot.to_rgb_image().ok_or(ComposeError::NotRgb)?;
        encode_png(&img)
    }
}

impl Default for ResultComposer {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>, ComposeError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Strokes `thickness` nested outlines inward from the rect's edge, clipped
/// to the image.
fn draw_outline(img: &mut RgbImage, rect: &Rect, color: Rgb<u8>, thickness: u32) {
    let (iw, ih) = (img.width() as i64, img.height() as i64);
    let x = rect.x.round() as i64;
    let y = rect.y.round() as i64;
    let w = rect.width.round() as i64;
    let h = rect.height.round() as i64;

    for inset in 0..thickness as i64 {
        let (sw, sh) = (w - 2 * inset, h - 2 * inset);
        if sw <= 0 || sh <= 0 {
            break;
        }
        let (sx, sy) = (x + inset, y + inset);
        if sx >= iw || sy >= ih || sx + sw <= 0 || sy + sh <= 0 {
            continue;
        }
        draw_hollow_rect_mut(
            img,
            PixelRect::at(sx as i32, sy as i32).of_size(sw as u32, sh as u32),
            color,
        );
    }
}
