use std::fmt;

use crate::game::domain::session::Session;
use crate::shared::constants::MISSION_SUCCESS_THRESHOLD;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    MissionSuccess,
    MissionFailure,
}

impl Verdict {
    /// The threshold is fixed; it does not scale with rounds or difficulty.
    pub fn from_success_count(success_count: u32) -> Self {
        if success_count >= MISSION_SUCCESS_THRESHOLD {
            Verdict::MissionSuccess
        } else {
            Verdict::MissionFailure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::MissionSuccess)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::MissionSuccess => write!(f, "Mission success!"),
            Verdict::MissionFailure => write!(f, "Mission failed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GalleryItem {
    pub round_number: u32,
    pub success: bool,
    pub face_count: u32,
    pub label: String,
    pub image_data: Vec<u8>,
}

/// What the result screen shows.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub target_person_count: u32,
    pub total_rounds: u32,
    pub rounds_played: u32,
    pub success_count: u32,
    pub verdict: Verdict,
    pub gallery: Vec<GalleryItem>,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Self {
        let gallery = session
            .photos()
            .iter()
            .map(|photo| GalleryItem {
                round_number: photo.round_number(),
                success: photo.success(),
                face_count: photo.detected_face_count(),
                label: photo.label(),
                image_data: photo.image_data().to_vec(),
            })
            .collect();

        Self {
            target_person_count: session.target_person_count(),
            total_rounds: session.total_rounds(),
            rounds_played: session.photos().len() as u32,
            success_count: session.success_count(),
            verdict: Verdict::from_success_count(session.success_count()),
            gallery,
        }
    }
}
