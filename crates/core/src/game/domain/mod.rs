pub mod box_generator;
pub mod difficulty;
pub mod round_timer;
pub mod scoring;
pub mod session;
pub mod session_summary;
