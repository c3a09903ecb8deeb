pub mod play_session_use_case;
