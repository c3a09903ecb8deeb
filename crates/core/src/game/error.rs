use thiserror::Error;

use crate::camera::domain::camera_source::CameraError;
use crate::game::round_state_machine::GamePhase;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(#[from] CameraError),
    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: GamePhase,
    },
    #[error("game cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = GameError::InvalidTransition {
            operation: "start the game",
            phase: GamePhase::Idle,
        };
        assert_eq!(err.to_string(), "cannot start the game while idle");
    }

    #[test]
    fn test_camera_error_converts() {
        let err: GameError = CameraError::Unavailable("no device".into()).into();
        assert_eq!(err.to_string(), "camera unavailable: no camera available: no device");
    }
}
