use crate::game::domain::box_generator::TargetBox;
use crate::game::domain::session::Photo;
use crate::game::domain::session_summary::SessionSummary;
use crate::presentation::screen::Screen;

/// Receives what the player should see as the game progresses.
///
/// Decouples the state machine from any particular front end (terminal,
/// GUI, log output) so each can render the same events its own way.
pub trait GameObserver: Send {
    fn screen_changed(&mut self, screen: Screen);

    /// One-line status text, e.g. "Starting camera...".
    fn status(&mut self, message: &str);

    fn round_started(&mut self, round: u32, total_rounds: u32, target_box: &TargetBox);

    /// Remaining countdown ticks, emitted on every tick including zero.
    fn countdown(&mut self, remaining: u32);

    fn round_captured(&mut self, photo: &Photo);

    /// User-facing error notification.
    fn error(&mut self, message: &str);

    /// Called when the result screen is ready. Default: no-op.
    fn summary(&mut self, _summary: &SessionSummary) {}
}

/// Silent observer, for tests and headless runs.
pub struct NullGameObserver;

impl GameObserver for NullGameObserver {
    fn screen_changed(&mut self, _screen: Screen) {}
    fn status(&mut self, _message: &str) {}
    fn round_started(&mut self, _round: u32, _total_rounds: u32, _target_box: &TargetBox) {}
    fn countdown(&mut self, _remaining: u32) {}
    fn round_captured(&mut self, _photo: &Photo) {}
    fn error(&mut self, _message: &str) {}
}

/// Forwards game events to the `log` facade.
#[derive(Default)]
pub struct LogGameObserver;

impl GameObserver for LogGameObserver {
    fn screen_changed(&mut self, screen: Screen) {
        log::debug!("Screen: {screen}");
    }

    fn status(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn round_started(&mut self, round: u32, total_rounds: u32, target_box: &TargetBox) {
        log::info!(
            "Round {round}/{total_rounds}: box {:.0}x{:.0} at ({:.0}, {:.0})",
            target_box.width,
            target_box.height,
            target_box.x,
            target_box.y
        );
    }

    fn countdown(&mut self, remaining: u32) {
        log::debug!("Countdown: {remaining}");
    }

    fn round_captured(&mut self, photo: &Photo) {
        log::info!(
            "Round {} captured: {} ({} faces)",
            photo.round_number(),
            if photo.success() { "success" } else { "fail" },
            photo.detected_face_count()
        );
    }

    fn error(&mut self, message: &str) {
        log::error!("{message}");
    }

    fn summary(&mut self, summary: &SessionSummary) {
        log::info!(
            "{} ({}/{} rounds succeeded)",
            summary.verdict,
            summary.success_count,
            summary.total_rounds
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(observer: &mut dyn GameObserver) {
        let b = TargetBox {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        };
        observer.screen_changed(Screen::Game);
        observer.status("hello");
        observer.round_started(1, 10, &b);
        observer.countdown(3);
        observer.round_captured(&Photo::new(vec![], false, 0, 1));
        observer.error("oops");
    }

    #[test]
    fn test_null_observer_all_methods_are_noop() {
        exercise(&mut NullGameObserver);
    }

    #[test]
    fn test_log_observer_accepts_all_events() {
        exercise(&mut LogGameObserver);
    }
}
