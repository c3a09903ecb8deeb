mod terminal_renderer;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;

use headcount_core::camera::domain::camera_source::{CameraConstraints, CameraSource};
use headcount_core::camera::infrastructure::ffmpeg_camera::{CameraInput, FfmpegCamera};
use headcount_core::camera::infrastructure::still_image_camera::StillImageCamera;
use headcount_core::composition::result_composer::ResultComposer;
use headcount_core::detection::infrastructure::model_resolver;
use headcount_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use headcount_core::game::domain::difficulty::Difficulty;
use headcount_core::game::error::GameError;
use headcount_core::game::round_state_machine::{MachineConfig, RoundStateMachine};
use headcount_core::pipeline::play_session_use_case::{GameTiming, PlaySessionUseCase};
use headcount_core::settings::GameSettings;
use headcount_core::shared::constants::{
    COUNTDOWN_TICKS, FACE_MODEL_NAME, IMAGE_EXTENSIONS, MAX_TARGET_PERSONS, MIN_TARGET_PERSONS,
};
use headcount_core::shared::rect::FrameSize;

use crate::terminal_renderer::TerminalRenderer;

#[cfg(target_os = "macos")]
const DEFAULT_DEVICE: &str = "0";
#[cfg(target_os = "windows")]
const DEFAULT_DEVICE: &str = "video=Integrated Camera";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const DEFAULT_DEVICE: &str = "/dev/video0";

/// Fit exactly the right number of faces inside the box, ten rounds in a row.
#[derive(Parser)]
#[command(name = "headcount")]
struct Cli {
    /// Number of people to fit in the box (3-7). Asked for when omitted.
    #[arg(long)]
    players: Option<u32>,

    /// Camera device (platform default when omitted).
    #[arg(long, conflicts_with = "input")]
    device: Option<String>,

    /// Image or video file to play against instead of a camera.
    #[arg(long)]
    input: Option<PathBuf>,

    /// On-screen size used to place the box, as WIDTHxHEIGHT.
    #[arg(long)]
    display_size: Option<String>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f32>,

    /// Face model: local path or http(s) URL.
    #[arg(long)]
    model: Option<String>,

    /// TrueType font for result photo captions, replacing the bundled one.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Seed for box placement, for repeatable games.
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds per countdown tick.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Milliseconds to show each result before the next round.
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Exit after one game instead of offering another.
    #[arg(long)]
    no_restart: bool,

    /// Store the given options as the new defaults.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = apply_overrides(GameSettings::load(), &cli)?;
    if cli.save_settings {
        settings.save()?;
        log::info!("Settings saved");
    }

    let composer = match &settings.font {
        Some(path) => ResultComposer::with_font_file(path)?,
        None => ResultComposer::new(),
    };
    let display_size = settings
        .display_size
        .map(|(w, h)| FrameSize::new(w as f64, h as f64));

    let mut machine = RoundStateMachine::new(
        open_camera(&cli),
        Box::new(OnnxYoloDetector::new(settings.confidence as f64)),
        composer,
        Box::new(TerminalRenderer::new(display_size)),
        MachineConfig {
            display_size,
            model_source: resolve_model(&settings.model),
            countdown_ticks: COUNTDOWN_TICKS,
            camera_constraints: CameraConstraints {
                ideal_width: settings.camera_width,
                ideal_height: settings.camera_height,
                ..CameraConstraints::default()
            },
            seed: cli.seed,
        },
    );
    let use_case = PlaySessionUseCase::new(
        GameTiming::from_settings(&settings),
        Arc::new(AtomicBool::new(false)),
    );

    loop {
        let players = match cli.players {
            Some(p) => p,
            None => prompt_players()?,
        };

        match use_case.execute(&mut machine, players) {
            Ok(_) => {}
            // Back to selection unless the team size came from the command line
            Err(GameError::CameraUnavailable(e)) if cli.players.is_none() => {
                log::warn!("Camera unavailable: {e}");
            }
            Err(e) => return Err(e.into()),
        }

        if cli.no_restart || !prompt_play_again()? {
            break;
        }
        machine.restart();
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(p) = cli.players {
        if !(MIN_TARGET_PERSONS..=MAX_TARGET_PERSONS).contains(&p) {
            return Err(format!(
                "Players must be between {MIN_TARGET_PERSONS} and {MAX_TARGET_PERSONS}, got {p}"
            )
            .into());
        }
    }
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
    }
    if let Some(c) = cli.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    if let Some(size) = &cli.display_size {
        parse_display_size(size)?;
    }
    if let Some(font) = &cli.font {
        if !font.exists() {
            return Err(format!("Font file not found: {}", font.display()).into());
        }
    }
    if cli.tick_ms == Some(0) {
        return Err("Tick interval must be at least 1 ms".into());
    }
    Ok(())
}

fn apply_overrides(
    mut settings: GameSettings,
    cli: &Cli,
) -> Result<GameSettings, Box<dyn std::error::Error>> {
    if let Some(c) = cli.confidence {
        settings.confidence = c;
    }
    if let Some(size) = &cli.display_size {
        settings.display_size = Some(parse_display_size(size)?);
    }
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if let Some(font) = &cli.font {
        settings.font = Some(font.clone());
    }
    if let Some(ms) = cli.tick_ms {
        settings.tick_ms = ms;
    }
    if let Some(ms) = cli.pause_ms {
        settings.pause_ms = ms;
    }
    Ok(settings)
}

fn parse_display_size(s: &str) -> Result<(u32, u32), String> {
    let invalid = || format!("Display size must look like 1280x720, got '{s}'");
    let lower = s.to_lowercase();
    let (w, h) = lower.split_once('x').ok_or_else(invalid)?;
    match (w.trim().parse::<u32>(), h.trim().parse::<u32>()) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(invalid()),
    }
}

fn open_camera(cli: &Cli) -> Box<dyn CameraSource> {
    match &cli.input {
        Some(path) if is_image(path) => Box::new(StillImageCamera::new(path.clone())),
        Some(path) => Box::new(FfmpegCamera::new(CameraInput::File(path.clone()))),
        None => Box::new(FfmpegCamera::new(CameraInput::Device(
            cli.device.clone().unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
        ))),
    }
}

/// Downloads the model up front so progress can be shown. On failure the
/// game runs without face detection; the download is not attempted again.
fn resolve_model(source: &str) -> Option<String> {
    log::info!("Resolving model: {source}");
    let progress: model_resolver::ProgressFn = Box::new(download_progress);
    let resolved = model_resolver::resolve_source(source, FACE_MODEL_NAME, Some(progress));
    eprintln!();
    match resolved {
        Ok(path) => Some(path.display().to_string()),
        Err(e) => {
            log::warn!("Could not fetch face model: {e}");
            None
        }
    }
}

fn prompt_players() -> Result<u32, Box<dyn std::error::Error>> {
    let tiers: Vec<String> = Difficulty::standard_tiers()
        .map(|d| format!("[{}]", d.target_persons()))
        .collect();
    let stdin = io::stdin();
    loop {
        print!("How many people? {} ", tiers.join(" "));
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err("No team size chosen".into());
        }
        match line.trim().parse::<u32>() {
            Ok(n) if Difficulty::new(n).is_standard() => return Ok(n),
            _ => println!("Pick a number from {MIN_TARGET_PERSONS} to {MAX_TARGET_PERSONS}."),
        }
    }
}

fn prompt_play_again() -> Result<bool, Box<dyn std::error::Error>> {
    print!("Play again? [Y/n] ");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(!matches!(line.trim().to_lowercase().as_str(), "n" | "no" | "q"))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_size() {
        assert_eq!(parse_display_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_display_size("800X600"), Ok((800, 600)));
        assert!(parse_display_size("0x720").is_err());
        assert!(parse_display_size("wide").is_err());
    }

    #[test]
    fn test_players_out_of_range_rejected() {
        let cli = Cli::parse_from(["headcount", "--players", "9"]);
        assert!(validate(&cli).is_err());
        let cli = Cli::parse_from(["headcount", "--players", "5"]);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from([
            "headcount",
            "--confidence",
            "0.3",
            "--display-size",
            "640x360",
            "--tick-ms",
            "200",
        ]);
        let settings = apply_overrides(GameSettings::default(), &cli).unwrap();
        assert_eq!(settings.confidence, 0.3);
        assert_eq!(settings.display_size, Some((640, 360)));
        assert_eq!(settings.tick_ms, 200);
        assert_eq!(settings.pause_ms, GameSettings::default().pause_ms);
    }

    #[test]
    fn test_unresolvable_model_is_dropped() {
        assert_eq!(resolve_model("/nonexistent/face-model.onnx"), None);
    }

    #[test]
    fn test_image_inputs_are_detected_by_extension() {
        assert!(is_image(Path::new("team.JPG")));
        assert!(!is_image(Path::new("team.mp4")));
    }
}
