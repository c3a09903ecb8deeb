use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{after, select, tick, Receiver};

use crate::game::domain::session_summary::SessionSummary;
use crate::game::error::GameError;
use crate::game::round_state_machine::{RoundAdvance, RoundStateMachine, TickResult};
use crate::settings::GameSettings;
use crate::shared::constants::{READY_DELAY_MS, RESULT_PAUSE_MS, TICK_INTERVAL_MS};

/// How often a blocked wait re-checks the cancellation flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameTiming {
    pub tick: Duration,
    pub pause: Duration,
    /// Between the model finishing loading and round one.
    pub ready: Duration,
}

impl Default for GameTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(TICK_INTERVAL_MS),
            pause: Duration::from_millis(RESULT_PAUSE_MS),
            ready: Duration::from_millis(READY_DELAY_MS),
        }
    }
}

impl GameTiming {
    pub fn from_settings(settings: &GameSettings) -> Self {
        Self {
            tick: Duration::from_millis(settings.tick_ms),
            pause: Duration::from_millis(settings.pause_ms),
            ready: Duration::from_millis(settings.ready_ms),
        }
    }
}

/// Plays one session in real time: feeds countdown ticks and pause
/// completions into a [`RoundStateMachine`] until the result screen.
///
/// Each round gets a fresh tick receiver, so ticks scheduled for an
/// earlier round can never reach a later one.
pub struct PlaySessionUseCase {
    timing: GameTiming,
    cancelled: Arc<AtomicBool>,
}

impl PlaySessionUseCase {
    pub fn new(timing: GameTiming, cancelled: Arc<AtomicBool>) -> Self {
        Self { timing, cancelled }
    }

    /// Runs selection through to the result screen. On cancellation the
    /// machine is restarted (camera released) and `GameError::Cancelled`
    /// returned.
    pub fn execute(
        &self,
        machine: &mut RoundStateMachine,
        target_persons: u32,
    ) -> Result<SessionSummary, GameError> {
        self.check_cancelled(machine)?;
        machine.select_difficulty(target_persons)?;
        self.wait(&after(self.timing.ready), machine)?;

        let mut advance = machine.start_game()?;
        loop {
            let id = match advance {
                RoundAdvance::Started(id) => id,
                RoundAdvance::Finished(summary) => return Ok(summary),
            };

            let ticker = tick(self.timing.tick);
            loop {
                self.wait(&ticker, machine)?;
                match machine.on_tick(id)? {
                    TickResult::Countdown(_) => {}
                    TickResult::Captured { .. } => break,
                    TickResult::Ignored => {
                        log::debug!("Countdown tick ignored in {}", machine.phase());
                        break;
                    }
                }
            }

            self.wait(&after(self.timing.pause), machine)?;
            advance = machine.advance()?;
        }
    }

    fn wait(
        &self,
        rx: &Receiver<Instant>,
        machine: &mut RoundStateMachine,
    ) -> Result<(), GameError> {
        let poll = tick(CANCEL_POLL_INTERVAL);
        loop {
            self.check_cancelled(machine)?;
            select! {
                recv(rx) -> _ => return Ok(()),
                recv(poll) -> _ => {}
            }
        }
    }

    fn check_cancelled(&self, machine: &mut RoundStateMachine) -> Result<(), GameError> {
        if self.cancelled.load(Ordering::Relaxed) {
            log::info!("Game cancelled");
            machine.restart();
            return Err(GameError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing_uses_game_constants() {
        let timing = GameTiming::default();
        assert_eq!(timing.tick, Duration::from_secs(1));
        assert_eq!(timing.pause, Duration::from_millis(1500));
        assert_eq!(timing.ready, Duration::from_secs(1));
    }

    #[test]
    fn test_timing_from_settings() {
        let settings = GameSettings {
            tick_ms: 5,
            pause_ms: 7,
            ready_ms: 0,
            ..GameSettings::default()
        };
        assert_eq!(
            GameTiming::from_settings(&settings),
            GameTiming {
                tick: Duration::from_millis(5),
                pause: Duration::from_millis(7),
                ready: Duration::ZERO,
            }
        );
    }
}
