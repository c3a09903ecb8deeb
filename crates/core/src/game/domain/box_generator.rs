use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::domain::difficulty::Difficulty;
use crate::shared::rect::{FrameSize, Rect};

/// Height is the drawn width times a factor in this range.
const ASPECT_JITTER: (f64, f64) = (0.8, 1.2);

/// A target box in display (on-screen) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TargetBox {
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Places a randomly sized target box fully inside the visible frame.
pub struct BoxGenerator {
    rng: StdRng,
}

impl BoxGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Width is drawn from the tier's ratio range of the frame's shorter
    /// side; both sides are clamped to the frame so the placement range is
    /// never negative.
    pub fn generate(&mut self, difficulty: Difficulty, frame: FrameSize) -> TargetBox {
        let frame_w = sanitize(frame.width);
        let frame_h = sanitize(frame.height);
        let shorter = FrameSize::new(frame_w, frame_h).shorter_side();

        let (min_ratio, max_ratio) = difficulty.size_ratios();
        let width = self.uniform(min_ratio * shorter, max_ratio * shorter);
        let height = width * self.uniform(ASPECT_JITTER.0, ASPECT_JITTER.1);

        let width = width.min(frame_w);
        let height = height.min(frame_h);

        let x = fit_within(self.uniform(0.0, frame_w - width), width, frame_w);
        let y = fit_within(self.uniform(0.0, frame_h - height), height, frame_h);

        TargetBox {
            x,
            y,
            width,
            height,
        }
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        }
    }
}

/// Moves `start` down until `start + extent` no longer rounds past `limit`.
/// Expects `0 <= extent <= limit`.
fn fit_within(start: f64, extent: f64, limit: f64) -> f64 {
    let mut start = start.clamp(0.0, (limit - extent).max(0.0));
    while start > 0.0 && start + extent > limit {
        // Next representable value below a positive float
        start = f64::from_bits(start.to_bits() - 1);
    }
    start
}

fn sanitize(side: f64) -> f64 {
    if side.is_finite() {
        side.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn assert_inside(b: &TargetBox, frame: FrameSize) {
        assert!(b.x >= 0.0, "x {} < 0", b.x);
        assert!(b.y >= 0.0, "y {} < 0", b.y);
        assert!(b.x + b.width <= frame.width, "{b:?} overflows width");
        assert!(b.y + b.height <= frame.height, "{b:?} overflows height");
    }

    #[rstest]
    fn test_boxes_stay_inside_frame(
        #[values(3, 4, 5, 6, 7)] tier: u32,
        #[values((1280.0, 720.0), (720.0, 1280.0), (640.0, 640.0), (300.0, 40.0))] size: (
            f64,
            f64,
        ),
    ) {
        let frame = FrameSize::new(size.0, size.1);
        let mut generator = BoxGenerator::new(Some(u64::from(tier)));
        for _ in 0..500 {
            let b = generator.generate(Difficulty::new(tier), frame);
            assert_inside(&b, frame);
        }
    }

    #[rstest]
    #[case(3)]
    #[case(5)]
    #[case(7)]
    fn test_width_within_tier_ratio_of_shorter_side(#[case] tier: u32) {
        // Wide frame so neither side is clamped
        let frame = FrameSize::new(4000.0, 1000.0);
        let (lo, hi) = Difficulty::new(tier).size_ratios();
        let mut generator = BoxGenerator::new(Some(7));
        for _ in 0..200 {
            let b = generator.generate(Difficulty::new(tier), frame);
            assert!(b.width >= lo * 1000.0 - 1e-9 && b.width <= hi * 1000.0 + 1e-9);
            let aspect = b.height / b.width;
            assert!((0.8 - 1e-9..=1.2 + 1e-9).contains(&aspect), "aspect {aspect}");
        }
    }

    #[test]
    fn test_tall_box_is_clamped_to_frame_height() {
        // Tier 7 can draw 0.85 * 1.2 = 1.02 of the shorter side
        let frame = FrameSize::new(1000.0, 100.0);
        let mut generator = BoxGenerator::new(Some(99));
        for _ in 0..500 {
            let b = generator.generate(Difficulty::new(7), frame);
            assert!(b.height <= 100.0);
            assert_inside(&b, frame);
        }
    }

    #[test]
    fn test_far_edge_placement_does_not_round_past_frame() {
        let (frame_w, width) = (3976.3462304637783, 1572.8228373050695);
        assert!((frame_w - width) + width > frame_w);

        let x = fit_within(frame_w - width, width, frame_w);
        assert!(x + width <= frame_w);
        assert!(x > frame_w - width - 1e-9);
    }

    #[test]
    fn test_boxes_fit_awkward_frame_sizes() {
        let frame = FrameSize::new(3976.3462304637783, 2236.6947326985377);
        for seed in 0..50 {
            let mut generator = BoxGenerator::new(Some(seed));
            for tier in 3..=7 {
                let b = generator.generate(Difficulty::new(tier), frame);
                assert_inside(&b, frame);
            }
        }
    }

    #[test]
    fn test_zero_sized_frame_yields_empty_box_at_origin() {
        let mut generator = BoxGenerator::new(Some(1));
        let b = generator.generate(Difficulty::new(4), FrameSize::new(0.0, 0.0));
        assert_relative_eq!(b.x, 0.0);
        assert_relative_eq!(b.y, 0.0);
        assert_relative_eq!(b.width, 0.0);
        assert_relative_eq!(b.height, 0.0);
    }

    #[test]
    fn test_same_seed_same_boxes() {
        let frame = FrameSize::new(1280.0, 720.0);
        let mut a = BoxGenerator::new(Some(42));
        let mut b = BoxGenerator::new(Some(42));
        for _ in 0..10 {
            assert_eq!(
                a.generate(Difficulty::new(5), frame),
                b.generate(Difficulty::new(5), frame)
            );
        }
    }

    #[test]
    fn test_larger_tiers_draw_larger_boxes_on_average() {
        let frame = FrameSize::new(1280.0, 720.0);
        let mut generator = BoxGenerator::new(Some(3));
        let mean_width = |g: &mut BoxGenerator, tier: u32| {
            (0..200)
                .map(|_| g.generate(Difficulty::new(tier), frame).width)
                .sum::<f64>()
                / 200.0
        };
        let small = mean_width(&mut generator, 3);
        let large = mean_width(&mut generator, 7);
        assert!(large > small);
    }
}
