use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use anyhow::{anyhow, Result};
use tempfile::TempDir;

use upright::detect::{PoseDetection, ScriptedBackend, StubBackend};
use upright::{
    AnalysisOptions, BatchDriver, BatchOptions, ChannelReporter, FileOutcome, FrameSource,
    ProgressEvent, ProgressReporter, RotateError, RotationAction, RotationExecutor, Verdict,
    VideoFile, VideoOpener,
};

/// Serves synthetic clips for known file names; anything else fails to open.
struct ClipOpener {
    clips: HashMap<String, String>,
}

impl ClipOpener {
    fn new(clips: &[(&str, &str)]) -> Self {
        Self {
            clips: clips
                .iter()
                .map(|(name, clip)| (name.to_string(), clip.to_string()))
                .collect(),
        }
    }
}

impl VideoOpener for ClipOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        let name = file_name(path);
        let clip = self
            .clips
            .get(&name)
            .ok_or_else(|| anyhow!("unsupported container in {}", name))?;
        Ok(Box::new(VideoFile::open(Path::new(clip))?))
    }
}

/// Records rotations and writes a marker output instead of running ffmpeg.
#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<(String, RotationAction)>>,
    failing: Vec<String>,
}

impl RecordingExecutor {
    fn failing_on(name: &str) -> Self {
        Self {
            failing: vec![name.to_string()],
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, RotationAction)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RotationExecutor for RecordingExecutor {
    fn rotate(
        &self,
        input: &Path,
        output: &Path,
        action: RotationAction,
    ) -> Result<(), RotateError> {
        let name = file_name(input);
        self.calls.lock().unwrap().push((name.clone(), action));
        if self.failing.contains(&name) {
            return Err(RotateError::ToolFailed {
                binary: "ffmpeg".into(),
                status: "exit status: 1".into(),
                stderr: "moov atom not found".into(),
            });
        }
        fs::write(output, format!("rotated {}", action.direction().unwrap())).unwrap();
        Ok(())
    }
}

/// Requests a stop as soon as the first file finishes.
struct StopAfterFirst {
    flag: Arc<AtomicBool>,
}

impl ProgressReporter for StopAfterFirst {
    fn report(&self, event: ProgressEvent) {
        if let ProgressEvent::FileFinished { .. } = event {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

fn one_frame_options() -> BatchOptions {
    BatchOptions {
        analysis: AnalysisOptions {
            sample_frames: 1,
            ..AnalysisOptions::default()
        },
        ..BatchOptions::default()
    }
}

fn folder(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        fs::write(dir.path().join(name), format!("original {}", name)).unwrap();
    }
    dir
}

fn upright() -> PoseDetection {
    PoseDetection::builder(0.92)
        .torso((103.0, 100.0), (100.0, 110.0), (103.0, 90.0))
        .build()
}

fn upside_down() -> PoseDetection {
    PoseDetection::builder(0.92)
        .torso((100.0, 110.0), (103.0, 100.0), (100.0, 125.0))
        .build()
}

fn lying_head_right() -> PoseDetection {
    PoseDetection::builder(0.92)
        .torso((110.0, 103.0), (100.0, 100.0), (125.0, 103.0))
        .build()
}

fn lying_head_left() -> PoseDetection {
    PoseDetection::builder(0.92)
        .torso((110.0, 103.0), (120.0, 100.0), (95.0, 103.0))
        .build()
}

#[test]
fn corrects_a_mixed_folder() {
    let dir = folder(&[
        "a_upright.mp4",
        "b_sideways.MOV",
        "c_empty.mkv",
        "d_broken.avi",
        "e_upside_down.mp4",
        "notes.txt",
    ]);
    fs::create_dir(dir.path().join("nested.mp4")).unwrap();

    let opener = ClipOpener::new(&[
        ("a_upright.mp4", "stub://30"),
        ("b_sideways.MOV", "stub://30"),
        ("c_empty.mkv", "stub://30"),
        ("e_upside_down.mp4", "stub://30"),
    ]);
    let executor = RecordingExecutor::default();
    let (tx, rx) = mpsc::channel();
    let reporter = ChannelReporter::new(tx);
    let mut backend = ScriptedBackend::new()
        .then_detect(vec![upright()])
        .then_detect(vec![lying_head_right()])
        .then_detect(vec![])
        .then_detect(vec![upside_down()]);
    let stats = backend.stats();

    let driver = BatchDriver::new(&opener, &executor, &reporter, one_frame_options());
    let summary = driver.run(dir.path(), &mut backend).unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.copied, 2);
    assert_eq!(summary.rotated, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert!(!summary.stopped_early);
    assert_eq!(stats.detect_calls(), 4);

    let names: Vec<&str> = summary.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "a_upright.mp4",
            "b_sideways.MOV",
            "c_empty.mkv",
            "d_broken.avi",
            "e_upside_down.mp4"
        ]
    );
    assert!(matches!(
        summary.files[0].outcome,
        FileOutcome::Copied {
            action: RotationAction::Identity,
            ..
        }
    ));
    assert_eq!(
        summary.files[2].outcome,
        FileOutcome::Copied {
            verdict: Verdict::Undetermined,
            action: RotationAction::Unknown,
        }
    );
    assert!(matches!(summary.files[3].outcome, FileOutcome::Skipped { .. }));

    assert_eq!(
        executor.calls(),
        vec![
            ("b_sideways.MOV".to_string(), RotationAction::RotateCcw90),
            ("e_upside_down.mp4".to_string(), RotationAction::Rotate180),
        ]
    );

    let out = dir.path().join("corrected");
    assert_eq!(summary.output_dir.as_deref(), Some(out.as_path()));
    assert_eq!(
        fs::read_to_string(out.join("a_upright.mp4")).unwrap(),
        "original a_upright.mp4"
    );
    assert_eq!(
        fs::read_to_string(out.join("c_empty.mkv")).unwrap(),
        "original c_empty.mkv"
    );
    assert_eq!(
        fs::read_to_string(out.join("b_sideways.MOV")).unwrap(),
        "rotated counterclockwise"
    );
    assert!(!out.join("d_broken.avi").exists());
    assert!(!out.join("notes.txt").exists());

    drop(driver);
    drop(reporter);
    let events: Vec<ProgressEvent> = rx.iter().collect();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { total: 5 })));
    assert!(matches!(events.last(), Some(ProgressEvent::Finished { .. })));
    let finished = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::FileFinished { .. }))
        .count();
    assert_eq!(finished, 5);
    assert_eq!(events[events.len() - 2].percent(), Some(100.0));
}

#[test]
fn failed_rotation_does_not_halt_the_batch() {
    let dir = folder(&["one.mp4", "two.mp4"]);
    let opener = ClipOpener::new(&[("one.mp4", "stub://5"), ("two.mp4", "stub://5")]);
    let executor = RecordingExecutor::failing_on("one.mp4");
    let (tx, _rx) = mpsc::channel();
    let reporter = ChannelReporter::new(tx);
    let mut backend = ScriptedBackend::repeating(vec![lying_head_left()]);

    let summary = BatchDriver::new(&opener, &executor, &reporter, one_frame_options())
        .run(dir.path(), &mut backend)
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.rotated, 1);
    match &summary.files[0].outcome {
        FileOutcome::Failed { error } => assert!(error.contains("moov atom not found")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        executor.calls(),
        vec![
            ("one.mp4".to_string(), RotationAction::RotateCw90),
            ("two.mp4".to_string(), RotationAction::RotateCw90),
        ]
    );
    assert!(!dir.path().join("corrected").join("one.mp4").exists());
    assert!(dir.path().join("corrected").join("two.mp4").exists());
}

#[test]
fn stop_flag_is_checked_between_files() {
    let dir = folder(&["a.mp4", "b.mp4", "c.mp4"]);
    let opener = ClipOpener::new(&[
        ("a.mp4", "stub://5"),
        ("b.mp4", "stub://5"),
        ("c.mp4", "stub://5"),
    ]);
    let executor = RecordingExecutor::default();
    let flag = Arc::new(AtomicBool::new(false));
    let reporter = StopAfterFirst { flag: flag.clone() };
    let mut backend = StubBackend::new();

    let summary = BatchDriver::new(&opener, &executor, &reporter, one_frame_options())
        .with_stop_flag(flag)
        .run(dir.path(), &mut backend)
        .unwrap();

    assert!(summary.stopped_early);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.processed(), 1);
    assert_eq!(backend.frames_seen(), 1);
    assert!(dir.path().join("corrected").join("a.mp4").exists());
    assert!(!dir.path().join("corrected").join("b.mp4").exists());
}

#[test]
fn honors_output_subdir_and_handles_empty_folders() {
    let dir = folder(&["readme.md"]);
    let opener = ClipOpener::new(&[]);
    let executor = RecordingExecutor::default();
    let (tx, rx) = mpsc::channel();
    let reporter = ChannelReporter::new(tx);
    let options = BatchOptions {
        output_subdir: "fixed".into(),
        ..BatchOptions::default()
    };
    let mut backend = StubBackend::new();

    let summary = BatchDriver::new(&opener, &executor, &reporter, options)
        .run(dir.path(), &mut backend)
        .unwrap();

    assert_eq!(summary.total, 0);
    assert_eq!(summary.processed(), 0);
    assert!(dir.path().join("fixed").is_dir());
    assert!(matches!(rx.recv().unwrap(), ProgressEvent::Started { total: 0 }));
    assert!(matches!(rx.recv().unwrap(), ProgressEvent::Finished { .. }));
}

#[test]
fn rejects_missing_input_folder() {
    let dir = TempDir::new().unwrap();
    let missing: PathBuf = dir.path().join("missing");
    let opener = ClipOpener::new(&[]);
    let executor = RecordingExecutor::default();
    let (tx, _rx) = mpsc::channel();
    let reporter = ChannelReporter::new(tx);
    let mut backend = StubBackend::new();

    let result = BatchDriver::new(&opener, &executor, &reporter, BatchOptions::default())
        .run(&missing, &mut backend);
    assert!(result.is_err());
    assert!(!missing.exists());
}
