use std::fmt;

use crate::game::round_state_machine::GamePhase;

/// The three mutually exclusive views of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Difficulty buttons.
    Selection,
    /// Live camera, target box, countdown and status line.
    Game,
    /// Verdict, success tally and photo gallery with a restart action.
    Result,
}

impl Screen {
    pub fn for_phase(phase: &GamePhase) -> Self {
        match phase {
            GamePhase::Idle => Screen::Selection,
            GamePhase::CameraInit
            | GamePhase::Detecting
            | GamePhase::Ready
            | GamePhase::Running { .. } => Screen::Game,
            GamePhase::Finished => Screen::Result,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Selection => write!(f, "selection"),
            Screen::Game => write!(f, "game"),
            Screen::Result => write!(f, "result"),
        }
    }
}
