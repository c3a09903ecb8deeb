/// Width and height of a frame, either as displayed on screen or as
/// delivered natively by the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl FrameSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn shorter_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Per-axis factors mapping one coordinate space onto another.
///
/// The two axes scale independently since the displayed aspect ratio may
/// differ from the camera's native one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// Factors taking `from` coordinates to `to` coordinates.
    ///
    /// A zero (or non-finite) source dimension maps with factor 1.0.
    pub fn between(from: FrameSize, to: FrameSize) -> Self {
        Self {
            x: axis_factor(from.width, to.width),
            y: axis_factor(from.height, to.height),
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            x: 1.0 / self.x,
            y: 1.0 / self.y,
        }
    }
}

fn axis_factor(from: f64, to: f64) -> f64 {
    let factor = to / from;
    if from > 0.0 && factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    }
}

/// Axis-aligned rectangle with its top-left corner at `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from corner coordinates `[x1, y1, x2, y2]`.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive on all four edges.
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn scaled(&self, factors: ScaleFactors) -> Rect {
        Rect {
            x: self.x * factors.x,
            y: self.y * factors.y,
            width: self.width * factors.x,
            height: self.height * factors.y,
        }
    }

    pub fn fits_within(&self, size: FrameSize) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= size.width
            && self.bottom() <= size.height
    }

    /// Intersects with the frame bounds; returns a zero-sized rect when the
    /// rectangle lies entirely outside.
    pub fn clamped_to(&self, size: FrameSize) -> Rect {
        let x1 = self.x.clamp(0.0, size.width);
        let y1 = self.y.clamp(0.0, size.height);
        let x2 = self.right().clamp(0.0, size.width);
        let y2 = self.bottom().clamp(0.0, size.height);
        Rect::from_corners(x1, y1, x2.max(x1), y2.max(y1))
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn iou(&self, other: &Rect) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}
