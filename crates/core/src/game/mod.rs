pub mod domain;
pub mod error;
pub mod game_observer;
pub mod round_state_machine;
