use crate::game::domain::difficulty::Difficulty;
use crate::shared::constants::TOTAL_ROUNDS;

/// One captured round. Immutable once recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct Photo {
    image_data: Vec<u8>,
    success: bool,
    detected_face_count: u32,
    round_number: u32,
}

impl Photo {
    pub fn new(
        image_data: Vec<u8>,
        success: bool,
        detected_face_count: u32,
        round_number: u32,
    ) -> Self {
        Self {
            image_data,
            success,
            detected_face_count,
            round_number,
        }
    }

    /// PNG-encoded result image.
    pub fn image_data(&self) -> &[u8] {
        &self.image_data
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn detected_face_count(&self) -> u32 {
        self.detected_face_count
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    /// Gallery label: a check mark on success, otherwise the face count.
    pub fn label(&self) -> String {
        if self.success {
            "✓ Success".to_string()
        } else {
            format!("✗ {} faces", self.detected_face_count)
        }
    }
}

/// State of one play-through.
///
/// Invariants: `success_count <= current_round <= total_rounds`, and
/// `photos.len() == current_round` once the current round has captured.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    target_person_count: u32,
    total_rounds: u32,
    current_round: u32,
    success_count: u32,
    photos: Vec<Photo>,
    running: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            target_person_count: 0,
            total_rounds: TOTAL_ROUNDS,
            current_round: 0,
            success_count: 0,
            photos: Vec::new(),
            running: false,
        }
    }
}

impl Session {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            target_person_count: difficulty.target_persons(),
            ..Self::default()
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::new(self.target_person_count)
    }

    pub fn target_person_count(&self) -> u32 {
        self.target_person_count
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn rounds_remaining(&self) -> bool {
        self.current_round < self.total_rounds
    }

    /// Clears progress and marks the session running.
    pub(crate) fn begin(&mut self) {
        self.current_round = 0;
        self.success_count = 0;
        self.photos.clear();
        self.running = true;
    }

    /// Moves to the next round and returns its number, or `None` when all
    /// rounds are played.
    pub(crate) fn advance_round(&mut self) -> Option<u32> {
        if !self.rounds_remaining() {
            return None;
        }
        self.current_round += 1;
        Some(self.current_round)
    }

    /// Whether the current round already has its photo.
    pub fn current_round_captured(&self) -> bool {
        self.photos.len() as u32 == self.current_round
    }

    /// Appends the current round's photo. A second photo for the same round
    /// is refused.
    pub(crate) fn record(&mut self, photo: Photo) -> bool {
        if self.current_round == 0 || self.current_round_captured() {
            return false;
        }
        if photo.success() {
            self.success_count += 1;
        }
        self.photos.push(photo);
        true
    }

    pub(crate) fn stop(&mut self) {
        self.running = false;
    }
}
