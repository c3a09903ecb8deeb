use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use headcount_core::camera::domain::camera_source::{
    CameraConstraints, CameraError, CameraSource, CameraStream,
};
use headcount_core::composition::result_composer::ResultComposer;
use headcount_core::detection::domain::face_detector::{DetectedFace, FaceDetector};
use headcount_core::game::domain::box_generator::TargetBox;
use headcount_core::game::domain::session::Photo;
use headcount_core::game::domain::session_summary::Verdict;
use headcount_core::game::error::GameError;
use headcount_core::game::game_observer::GameObserver;
use headcount_core::game::round_state_machine::{GamePhase, MachineConfig, RoundStateMachine};
use headcount_core::pipeline::play_session_use_case::{GameTiming, PlaySessionUseCase};
use headcount_core::presentation::screen::Screen;
use headcount_core::shared::frame::Frame;
use headcount_core::shared::rect::Rect;
use headcount_core::shared::stream_metadata::StreamMetadata;

const WIDTH: u32 = 80;
const HEIGHT: u32 = 60;

// ── Stubs ──

struct FakeCamera {
    stops: Arc<AtomicUsize>,
}

impl CameraSource for FakeCamera {
    fn acquire(
        &mut self,
        _constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        Ok(Box::new(FakeStream {
            metadata: StreamMetadata {
                width: WIDTH,
                height: HEIGHT,
                fps: 30.0,
                device: "fake".into(),
            },
            live: true,
            stops: self.stops.clone(),
        }))
    }
}

struct FakeStream {
    metadata: StreamMetadata,
    live: bool,
    stops: Arc<AtomicUsize>,
}

impl CameraStream for FakeStream {
    fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    fn snapshot(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        Ok(Frame::blank(WIDTH, HEIGHT))
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Reports faces at the center of the box announced by the observer, so
/// every round matches `faces_per_round`.
struct BoxFollowingDetector {
    current_box: Arc<Mutex<Option<TargetBox>>>,
    faces_per_round: Vec<usize>,
    round: usize,
}

impl FaceDetector for BoxFollowingDetector {
    fn load_model(&mut self, _source: &str) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn detect_faces(
        &mut self,
        _frame: &Frame,
    ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let n = self.faces_per_round.get(self.round).copied().unwrap_or(0);
        self.round += 1;
        let b = self.current_box.lock().unwrap().ok_or("no box")?;
        let (cx, cy) = b.as_rect().center();
        Ok((0..n)
            .map(|_| DetectedFace::new(Rect::new(cx - 1.0, cy - 1.0, 2.0, 2.0), 0.8))
            .collect())
    }
}

struct BoxTracker {
    current_box: Arc<Mutex<Option<TargetBox>>>,
    screens: Arc<Mutex<Vec<Screen>>>,
}

impl GameObserver for BoxTracker {
    fn screen_changed(&mut self, screen: Screen) {
        self.screens.lock().unwrap().push(screen);
    }
    fn status(&mut self, _message: &str) {}
    fn round_started(&mut self, _round: u32, _total_rounds: u32, target_box: &TargetBox) {
        *self.current_box.lock().unwrap() = Some(*target_box);
    }
    fn countdown(&mut self, _remaining: u32) {}
    fn round_captured(&mut self, _photo: &Photo) {}
    fn error(&mut self, _message: &str) {}
}

struct Fixture {
    machine: RoundStateMachine,
    stops: Arc<AtomicUsize>,
    screens: Arc<Mutex<Vec<Screen>>>,
}

fn fixture(faces_per_round: Vec<usize>) -> Fixture {
    let stops = Arc::new(AtomicUsize::new(0));
    let current_box = Arc::new(Mutex::new(None));
    let screens = Arc::new(Mutex::new(Vec::new()));
    let machine = RoundStateMachine::new(
        Box::new(FakeCamera {
            stops: stops.clone(),
        }),
        Box::new(BoxFollowingDetector {
            current_box: current_box.clone(),
            faces_per_round,
            round: 0,
        }),
        ResultComposer::new(),
        Box::new(BoxTracker {
            current_box,
            screens: screens.clone(),
        }),
        MachineConfig {
            seed: Some(3),
            ..MachineConfig::default()
        },
    );
    Fixture {
        machine,
        stops,
        screens,
    }
}

fn fast_timing() -> GameTiming {
    GameTiming {
        tick: Duration::from_millis(1),
        pause: Duration::from_millis(1),
        ready: Duration::ZERO,
    }
}

// ── Tests ──

#[test]
fn full_session_reaches_result_screen_with_mission_success() {
    let mut f = fixture(vec![4, 4, 2, 4, 0, 5, 1, 1, 1, 1]);
    let use_case = PlaySessionUseCase::new(fast_timing(), Arc::new(AtomicBool::new(false)));

    let summary = use_case.execute(&mut f.machine, 4).unwrap();

    assert_eq!(summary.target_person_count, 4);
    assert_eq!(summary.rounds_played, 10);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.verdict, Verdict::MissionSuccess);
    assert_eq!(summary.gallery.len(), 10);
    assert_eq!(
        summary.gallery.iter().map(|g| g.round_number).collect::<Vec<_>>(),
        (1..=10).collect::<Vec<_>>()
    );
    assert_eq!(summary.gallery[5].label, "✗ 5 faces");
    assert_eq!(summary.gallery[0].label, "✓ Success");

    assert_eq!(f.machine.phase(), GamePhase::Finished);
    assert_eq!(f.stops.load(Ordering::SeqCst), 1);
    assert_eq!(
        *f.screens.lock().unwrap(),
        vec![Screen::Game, Screen::Result]
    );
}

#[test]
fn two_successes_is_mission_failure() {
    let mut f = fixture(vec![3, 3]);
    let use_case = PlaySessionUseCase::new(fast_timing(), Arc::new(AtomicBool::new(false)));

    let summary = use_case.execute(&mut f.machine, 3).unwrap();
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.verdict, Verdict::MissionFailure);
}

#[test]
fn cancelled_session_returns_to_selection_and_releases_camera() {
    let mut f = fixture(vec![]);
    let cancelled = Arc::new(AtomicBool::new(false));
    let use_case = PlaySessionUseCase::new(
        GameTiming {
            tick: Duration::from_secs(60),
            ..fast_timing()
        },
        cancelled.clone(),
    );

    let flag = cancelled.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        flag.store(true, Ordering::Relaxed);
    });

    let err = use_case.execute(&mut f.machine, 5).unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, GameError::Cancelled));
    assert_eq!(f.machine.phase(), GamePhase::Idle);
    assert!(f.machine.session().photos().is_empty());
    assert_eq!(f.stops.load(Ordering::SeqCst), 1);
}

#[test]
fn machine_can_play_again_after_restart() {
    let mut f = fixture(vec![]);
    let use_case = PlaySessionUseCase::new(fast_timing(), Arc::new(AtomicBool::new(false)));

    use_case.execute(&mut f.machine, 3).unwrap();
    let previous = f.machine.restart();
    assert_eq!(previous.photos().len(), 10);

    let summary = use_case.execute(&mut f.machine, 7).unwrap();
    assert_eq!(summary.target_person_count, 7);
    assert_eq!(f.stops.load(Ordering::SeqCst), 2);
}
