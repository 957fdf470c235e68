//! upright - rotate people videos so their subjects stand upright.
//!
//! `run` corrects every video in a folder into a `corrected` subfolder.
//! `analyze` reports the orientation verdict for a single video as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

#[cfg(feature = "backend-tract")]
use upright::detect::TractBackend;
use upright::detect::StubBackend;
use upright::{
    Analyzer, BackendRegistry, BatchDriver, BatchSummary, ChannelReporter, FfmpegExecutor,
    FileOpener, LogReporter, PoseSession, ProgressEvent, ProgressReporter, UprightConfig,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "upright",
    about = "Detect and correct the orientation of videos of people"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// UI mode for progress (auto|plain|pretty|log)
    #[arg(long, global = true, env = "UPRIGHT_UI", default_value = "auto", value_name = "MODE")]
    ui: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correct every video in a folder
    Run(RunArgs),
    /// Print the orientation report for one video
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Folder containing .mp4/.mov/.avi/.mkv files
    dir: PathBuf,

    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Print the batch summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Video file to analyze
    file: PathBuf,

    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Write the middle sampled frame, rotated upright, as a JPEG
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalysisArgs {
    /// Pose backend (stub|tract)
    #[arg(long, value_name = "NAME")]
    backend: Option<String>,

    /// Path to a YOLOv8-pose ONNX model
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Frames sampled per video
    #[arg(long, value_name = "N")]
    sample_frames: Option<usize>,

    /// Minimum detection score (exclusive)
    #[arg(long, value_name = "SCORE")]
    confidence: Option<f32>,
}

impl AnalysisArgs {
    fn apply(&self, cfg: &mut UprightConfig) -> Result<()> {
        if let Some(backend) = &self.backend {
            cfg.model.backend = backend.clone();
        }
        if let Some(model) = &self.model {
            cfg.model.path = model.clone();
        }
        if let Some(frames) = self.sample_frames {
            cfg.sample_frames = frames;
        }
        if let Some(confidence) = self.confidence {
            cfg.confidence_threshold = confidence;
        }
        cfg.validate()
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&cli.ui), is_tty, !stdout_is_tty);
    let mut cfg = UprightConfig::load()?;

    match cli.command {
        Command::Run(args) => {
            args.analysis.apply(&mut cfg)?;
            run(&ui, &cfg, args)
        }
        Command::Analyze(args) => {
            args.analysis.apply(&mut cfg)?;
            analyze(&ui, &cfg, args)
        }
    }
}

fn start_session(ui: &ui::Ui, cfg: &UprightConfig) -> Result<PoseSession> {
    let _stage = ui.stage("Load pose backend");
    let mut registry = build_registry(cfg)?;
    registry
        .set_default(&cfg.model.backend)
        .with_context(|| format!("available backends: {}", registry.list().join(", ")))?;
    PoseSession::start(registry.take_default()?)
}

fn build_registry(cfg: &UprightConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::new());
    if cfg.model.backend == "tract" {
        register_tract(&mut registry, cfg)?;
    }
    Ok(registry)
}

#[cfg(feature = "backend-tract")]
fn register_tract(registry: &mut BackendRegistry, cfg: &UprightConfig) -> Result<()> {
    let size = cfg.model.input_size;
    registry.register(TractBackend::new(&cfg.model.path, size, size)?);
    Ok(())
}

#[cfg(not(feature = "backend-tract"))]
fn register_tract(_registry: &mut BackendRegistry, _cfg: &UprightConfig) -> Result<()> {
    Err(anyhow!(
        "tract backend requested but upright was built without the backend-tract feature"
    ))
}

fn run(ui: &ui::Ui, cfg: &UprightConfig, args: RunArgs) -> Result<()> {
    if !args.dir.is_dir() {
        return Err(anyhow!("{} is not a directory", args.dir.display()));
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            if stop.swap(true, Ordering::SeqCst) {
                std::process::exit(130);
            }
            log::warn!("stop requested; finishing the current video (Ctrl-C again to abort)");
        })
        .context("failed to install Ctrl-C handler")?;
    }

    let session = start_session(ui, cfg)?;
    let options = cfg.batch_options();
    let executor = FfmpegExecutor::new(cfg.ffmpeg.clone());
    let dir = args.dir.clone();
    let (tx, rx) = mpsc::channel();

    // The backend session is not reentrant: one worker owns it for the whole batch.
    let worker = thread::spawn(move || -> Result<BatchSummary> {
        let mut session = session;
        let opener = FileOpener;
        let reporter = ChannelReporter::new(tx);
        let driver =
            BatchDriver::new(&opener, &executor, &reporter, options).with_stop_flag(stop);
        let summary = driver.run(&dir, session.backend());
        session.close()?;
        summary
    });

    let mut progress = None;
    for event in rx {
        if ui.logs_progress() {
            LogReporter.report(event);
            continue;
        }
        let percent = event.percent().unwrap_or(100.0);
        match event {
            ProgressEvent::Started { total } => progress = Some(ui.batch(total)),
            ProgressEvent::FileStarted { index, total, name } => {
                if let Some(progress) = &progress {
                    progress.file_started(index, total, &name);
                }
            }
            ProgressEvent::FileFinished { name, outcome, .. } => {
                if let Some(progress) = &progress {
                    progress.file_finished(&name, &outcome, percent);
                }
            }
            ProgressEvent::Finished { summary } => {
                if let Some(progress) = &progress {
                    progress.finish(&summary);
                }
            }
        }
    }

    let summary = worker
        .join()
        .map_err(|_| anyhow!("batch worker panicked"))??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
        if let Some(dir) = &summary.output_dir {
            println!("output: {}", dir.display());
        }
    }
    if summary.failed > 0 {
        log::warn!("{} videos failed; see the log above", summary.failed);
    }
    Ok(())
}

fn analyze(ui: &ui::Ui, cfg: &UprightConfig, args: AnalyzeArgs) -> Result<()> {
    let mut options = cfg.analysis_options();
    options.keep_snapshot = args.snapshot.is_some();

    let mut session = start_session(ui, cfg)?;
    let opener = FileOpener;
    let analyzer = Analyzer::new(&opener, options);
    let report = {
        let _stage = ui.stage("Analyze video");
        analyzer.analyze(&args.file, session.backend())
    };
    session.close()?;
    let report = report?;

    if let Some(path) = &args.snapshot {
        match &report.snapshot {
            Some(frame) => {
                frame.rotated(report.action).save_jpeg(path)?;
                log::info!("snapshot written to {}", path.display());
            }
            None => log::warn!("no sampled frame decoded; snapshot not written"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
