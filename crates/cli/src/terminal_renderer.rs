use std::io::{self, Write};

use headcount_core::game::domain::box_generator::TargetBox;
use headcount_core::game::domain::session::Photo;
use headcount_core::game::domain::session_summary::SessionSummary;
use headcount_core::game::game_observer::GameObserver;
use headcount_core::presentation::screen::Screen;
use headcount_core::shared::rect::FrameSize;

const MAP_COLS: usize = 48;
const MAP_ROWS: usize = 14;

/// Renders the game screens as plain terminal output.
pub struct TerminalRenderer {
    frame_size: Option<FrameSize>,
}

impl TerminalRenderer {
    /// `frame_size` is the space the target box is placed in; without it the
    /// box is reported numerically only.
    pub fn new(frame_size: Option<FrameSize>) -> Self {
        Self { frame_size }
    }

    fn draw_box_map(&self, b: &TargetBox) {
        let Some(size) = self.frame_size else {
            return;
        };
        if size.width <= 0.0 || size.height <= 0.0 {
            return;
        }
        let col = |x: f64| ((x / size.width) * (MAP_COLS - 1) as f64).round() as usize;
        let row = |y: f64| ((y / size.height) * (MAP_ROWS - 1) as f64).round() as usize;
        let (left, right) = (col(b.x), col(b.x + b.width).min(MAP_COLS - 1));
        let (top, bottom) = (row(b.y), row(b.y + b.height).min(MAP_ROWS - 1));

        let mut out = String::new();
        for r in 0..MAP_ROWS {
            out.push_str("  ");
            for c in 0..MAP_COLS {
                let on_edge = ((r == top || r == bottom) && (left..=right).contains(&c))
                    || ((c == left || c == right) && (top..=bottom).contains(&r));
                out.push(if on_edge { '#' } else { '.' });
            }
            out.push('\n');
        }
        print!("{out}");
    }
}

impl GameObserver for TerminalRenderer {
    fn screen_changed(&mut self, screen: Screen) {
        match screen {
            Screen::Selection => println!("\n== Choose your team size =="),
            Screen::Game => println!("\n== Game =="),
            Screen::Result => println!("\n== Results =="),
        }
    }

    fn status(&mut self, message: &str) {
        println!("{message}");
    }

    fn round_started(&mut self, round: u32, total_rounds: u32, target_box: &TargetBox) {
        println!("\nRound {round}/{total_rounds}");
        self.draw_box_map(target_box);
    }

    fn countdown(&mut self, remaining: u32) {
        if remaining > 0 {
            print!("{remaining}... ");
        } else {
            println!("SNAP!");
        }
        let _ = io::stdout().flush();
    }

    fn round_captured(&mut self, photo: &Photo) {
        println!("  [{}] {}", photo.round_number(), photo.label());
    }

    fn error(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn summary(&mut self, summary: &SessionSummary) {
        println!("{}", summary.verdict);
        println!(
            "{}/{} rounds with exactly {} people",
            summary.success_count, summary.total_rounds, summary.target_person_count
        );
        for item in &summary.gallery {
            println!("  Round {:>2}: {}", item.round_number, item.label);
        }
    }
}
