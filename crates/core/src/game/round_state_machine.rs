use std::fmt;

use crate::camera::domain::camera_source::{
    CameraConstraints, CameraError, CameraSource, CameraStream,
};
use crate::composition::result_composer::{Overlay, ResultComposer};
use crate::detection::domain::face_detector::{DetectedFace, FaceDetector};
use crate::game::domain::box_generator::{BoxGenerator, TargetBox};
use crate::game::domain::difficulty::Difficulty;
use crate::game::domain::round_timer::{RoundTimer, TickOutcome, TimerId};
use crate::game::domain::scoring::{score_round, RoundScore};
use crate::game::domain::session::{Photo, Session};
use crate::game::domain::session_summary::SessionSummary;
use crate::game::error::GameError;
use crate::game::game_observer::GameObserver;
use crate::presentation::screen::Screen;
use crate::shared::constants::{COUNTDOWN_TICKS, FACE_MODEL_URL};
use crate::shared::frame::Frame;
use crate::shared::rect::{FrameSize, ScaleFactors};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStep {
    Countdown,
    /// Captured; showing the result before the next round.
    Pause,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    CameraInit,
    Detecting,
    Ready,
    Running { round: u32, step: RoundStep },
    Finished,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::Idle => write!(f, "idle"),
            GamePhase::CameraInit => write!(f, "starting the camera"),
            GamePhase::Detecting => write!(f, "loading the face model"),
            GamePhase::Ready => write!(f, "ready"),
            GamePhase::Running {
                round,
                step: RoundStep::Countdown,
            } => write!(f, "counting down round {round}"),
            GamePhase::Running {
                round,
                step: RoundStep::Pause,
            } => write!(f, "showing round {round}"),
            GamePhase::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionMode {
    Ready,
    /// The model failed to load; every round scores zero faces.
    Degraded,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TickResult {
    /// Stale or out-of-phase tick.
    Ignored,
    Countdown(u32),
    Captured {
        round: u32,
        success: bool,
        face_count: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum RoundAdvance {
    Started(TimerId),
    Finished(SessionSummary),
}

pub struct MachineConfig {
    /// On-screen size the box is placed in. `None` places it in native
    /// camera coordinates.
    pub display_size: Option<FrameSize>,
    /// Face model path or URL. `None` plays without face detection.
    pub model_source: Option<String>,
    pub countdown_ticks: u32,
    pub camera_constraints: CameraConstraints,
    pub seed: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            display_size: None,
            model_source: Some(FACE_MODEL_URL.to_string()),
            countdown_ticks: COUNTDOWN_TICKS,
            camera_constraints: CameraConstraints::default(),
            seed: None,
        }
    }
}

/// Drives one game at a time: camera and model setup, ten rounds of
/// box → countdown → capture → pause, and the result screen.
///
/// The machine owns the session, the camera stream and the countdown; the
/// caller feeds it timer ticks and pause completions (see
/// `PlaySessionUseCase`).
pub struct RoundStateMachine {
    phase: GamePhase,
    session: Session,
    camera: Box<dyn CameraSource>,
    stream: Option<Box<dyn CameraStream>>,
    native_size: FrameSize,
    detector: Box<dyn FaceDetector>,
    model_loaded: bool,
    model_attempted: bool,
    composer: ResultComposer,
    observer: Box<dyn GameObserver>,
    box_generator: BoxGenerator,
    timer: RoundTimer,
    target_box: Option<TargetBox>,
    config: MachineConfig,
}

impl RoundStateMachine {
    pub fn new(
        camera: Box<dyn CameraSource>,
        detector: Box<dyn FaceDetector>,
        composer: ResultComposer,
        observer: Box<dyn GameObserver>,
        config: MachineConfig,
    ) -> Self {
        Self {
            phase: GamePhase::Idle,
            session: Session::default(),
            camera,
            stream: None,
            native_size: FrameSize::new(0.0, 0.0),
            detector,
            model_loaded: false,
            model_attempted: false,
            composer,
            observer,
            box_generator: BoxGenerator::new(config.seed),
            timer: RoundTimer::new(config.countdown_ticks),
            target_box: None,
            config,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn screen(&self) -> Screen {
        Screen::for_phase(&self.phase)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_session(&self.session)
    }

    /// The box currently shown, hidden between capture and the next round.
    pub fn target_box(&self) -> Option<TargetBox> {
        self.target_box
    }

    pub fn detection_mode(&self) -> DetectionMode {
        if self.model_loaded {
            DetectionMode::Ready
        } else {
            DetectionMode::Degraded
        }
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        self.timer.is_active().then(|| self.timer.remaining())
    }

    pub fn display_size(&self) -> FrameSize {
        self.config.display_size.unwrap_or(self.native_size)
    }

    pub fn native_size(&self) -> FrameSize {
        self.native_size
    }

    pub fn camera_live(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    /// Starts a game for `target_persons`: acquires the camera, then loads
    /// the face model. Ends in `Ready`, or back in `Idle` if the camera
    /// cannot be started.
    pub fn select_difficulty(&mut self, target_persons: u32) -> Result<(), GameError> {
        self.expect_phase("select a difficulty", |p| matches!(p, GamePhase::Idle))?;

        let difficulty = Difficulty::new(target_persons);
        if !difficulty.is_standard() {
            log::warn!("{difficulty} is outside the standard tiers; using the smallest box range");
        }
        self.session = Session::new(difficulty);

        self.set_phase(GamePhase::CameraInit);
        self.observer.status("Starting camera...");
        if let Err(e) = self.open_camera() {
            self.observer.error(&format!(
                "Could not start the camera. Check camera permissions. ({e})"
            ));
            self.restart();
            return Err(GameError::CameraUnavailable(e));
        }

        self.set_phase(GamePhase::Detecting);
        self.observer.status("Loading face detection model...");
        self.load_detector();

        self.set_phase(GamePhase::Ready);
        self.observer.status("Ready to play!");
        Ok(())
    }

    /// Begins round one.
    pub fn start_game(&mut self) -> Result<RoundAdvance, GameError> {
        self.expect_phase("start the game", |p| matches!(p, GamePhase::Ready))?;
        self.session.begin();
        log::info!(
            "Game started: {} rounds, {}",
            self.session.total_rounds(),
            self.session.difficulty()
        );
        Ok(self.start_next_round())
    }

    /// Feeds one countdown tick. Ticks from superseded countdowns, or that
    /// arrive outside a countdown, are ignored.
    pub fn on_tick(&mut self, id: TimerId) -> Result<TickResult, GameError> {
        let GamePhase::Running {
            round,
            step: RoundStep::Countdown,
        } = self.phase
        else {
            return Ok(TickResult::Ignored);
        };

        match self.timer.tick(id) {
            TickOutcome::Stale => Ok(TickResult::Ignored),
            TickOutcome::Remaining(n) => {
                self.observer.countdown(n);
                Ok(TickResult::Countdown(n))
            }
            TickOutcome::Completed => {
                self.observer.countdown(0);
                let (success, face_count) = self.capture(round);
                self.set_phase(GamePhase::Running {
                    round,
                    step: RoundStep::Pause,
                });
                Ok(TickResult::Captured {
                    round,
                    success,
                    face_count,
                })
            }
        }
    }

    /// Ends the post-capture pause: starts the next round or finishes.
    pub fn advance(&mut self) -> Result<RoundAdvance, GameError> {
        self.expect_phase("advance to the next round", |p| {
            matches!(
                p,
                GamePhase::Running {
                    step: RoundStep::Pause,
                    ..
                }
            )
        })?;
        Ok(self.start_next_round())
    }

    /// Stops the camera and countdown and shows the result screen. Calling
    /// it again once finished just returns the summary.
    pub fn finish(&mut self) -> Result<SessionSummary, GameError> {
        self.expect_phase("finish", |p| {
            matches!(
                p,
                GamePhase::Ready | GamePhase::Running { .. } | GamePhase::Finished
            )
        })?;
        if self.phase == GamePhase::Finished {
            return Ok(self.summary());
        }

        self.release_camera();
        self.timer.cancel();
        self.target_box = None;
        self.session.stop();
        self.set_phase(GamePhase::Finished);

        let summary = self.summary();
        log::info!(
            "Game finished: {}/{} rounds succeeded",
            summary.success_count,
            summary.total_rounds
        );
        self.observer.summary(&summary);
        Ok(summary)
    }

    /// Returns to the selection screen from any phase with a fresh session,
    /// handing back the one that was replaced.
    pub fn restart(&mut self) -> Session {
        self.release_camera();
        self.timer.cancel();
        self.target_box = None;
        let mut previous = std::mem::take(&mut self.session);
        previous.stop();
        self.set_phase(GamePhase::Idle);
        previous
    }

    fn start_next_round(&mut self) -> RoundAdvance {
        let Some(round) = self.session.advance_round() else {
            // Finished is always reachable from Running
            return match self.finish() {
                Ok(summary) => RoundAdvance::Finished(summary),
                Err(_) => RoundAdvance::Finished(self.summary()),
            };
        };

        let target_box = self
            .box_generator
            .generate(self.session.difficulty(), self.display_size());
        self.target_box = Some(target_box);
        self.observer
            .round_started(round, self.session.total_rounds(), &target_box);
        self.observer.status(&format!(
            "Fit {} faces inside the box!",
            self.session.target_person_count()
        ));

        let id = self.timer.start();
        self.set_phase(GamePhase::Running {
            round,
            step: RoundStep::Countdown,
        });
        self.observer.countdown(self.timer.remaining());
        RoundAdvance::Started(id)
    }

    /// Snapshot, detect, score, compose and record. Always records exactly
    /// one photo for `round`.
    fn capture(&mut self, round: u32) -> (bool, u32) {
        self.observer.status("Capturing...");

        let snapshot = self.take_snapshot();
        let native = FrameSize::new(snapshot.width() as f64, snapshot.height() as f64);
        let faces = self.detect(&snapshot);

        let target_box = self.target_box.take().unwrap_or(TargetBox {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        });
        let to_native = ScaleFactors::between(self.display_size(), native);
        let score = score_round(
            &target_box,
            to_native,
            &faces,
            self.session.target_person_count(),
        );
        log::debug!(
            "Round {round}: {} detections, {} inside box, target {}",
            faces.len(),
            score.face_count(),
            self.session.target_person_count()
        );

        let image_data = self.compose(&snapshot, &score);
        let photo = Photo::new(image_data, score.success, score.face_count(), round);
        self.observer.round_captured(&photo);
        self.session.record(photo);

        self.observer.status(&if score.success {
            "Success! ✓".to_string()
        } else {
            format!("Fail ({} faces detected)", score.face_count())
        });
        (score.success, score.face_count())
    }

    fn take_snapshot(&mut self) -> Frame {
        let (w, h) = (self.native_size.width as u32, self.native_size.height as u32);
        match self.stream.as_mut().map(|s| s.snapshot()) {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                log::warn!("Snapshot failed ({e}); recording a blank frame");
                Frame::blank(w, h)
            }
            None => {
                log::warn!("No camera stream; recording a blank frame");
                Frame::blank(w, h)
            }
        }
    }

    fn detect(&mut self, frame: &Frame) -> Vec<DetectedFace> {
        if !self.model_loaded {
            return Vec::new();
        }
        match self.detector.detect_faces(frame) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Face detection failed ({e}); counting zero faces");
                Vec::new()
            }
        }
    }

    fn compose(&self, snapshot: &Frame, score: &RoundScore) -> Vec<u8> {
        let caption = score.caption();
        let overlay = Overlay {
            target_box: &score.native_box,
            counted_faces: &score.counted,
            caption: &caption,
            success: score.success,
        };
        match self.composer.compose(snapshot, &overlay) {
            Ok(png) => png,
            Err(e) => {
                log::warn!("Result overlay failed ({e}); keeping the plain snapshot");
                self.composer.encode_plain(snapshot).unwrap_or_else(|e| {
                    log::warn!("Snapshot encoding failed ({e}); photo has no image");
                    Vec::new()
                })
            }
        }
    }

    fn open_camera(&mut self) -> Result<(), CameraError> {
        let mut stream = self.camera.acquire(&self.config.camera_constraints)?;
        let native = stream.metadata().native_size();
        if native.width <= 0.0 || native.height <= 0.0 {
            stream.stop();
            return Err(CameraError::Metadata(format!(
                "{} reported a {}x{} frame",
                stream.metadata().device,
                native.width,
                native.height
            )));
        }
        self.native_size = native;
        self.stream = Some(stream);
        Ok(())
    }

    /// Loads the model on the first game only; a failure is not retried.
    fn load_detector(&mut self) {
        if self.model_attempted {
            return;
        }
        self.model_attempted = true;
        let Some(source) = self.config.model_source.as_deref() else {
            log::warn!("No face model available; playing without face detection");
            return;
        };
        match self.detector.load_model(source) {
            Ok(()) => self.model_loaded = true,
            Err(e) => {
                log::warn!("Face model failed to load ({e}); playing without face detection");
            }
        }
    }

    fn release_camera(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }

    fn set_phase(&mut self, phase: GamePhase) {
        let before = Screen::for_phase(&self.phase);
        self.phase = phase;
        let after = Screen::for_phase(&phase);
        if before != after {
            self.observer.screen_changed(after);
        }
    }

    fn expect_phase(
        &self,
        operation: &'static str,
        allowed: impl Fn(&GamePhase) -> bool,
    ) -> Result<(), GameError> {
        if allowed(&self.phase) {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }
}

impl Drop for RoundStateMachine {
    fn drop(&mut self) {
        self.release_camera();
    }
}
