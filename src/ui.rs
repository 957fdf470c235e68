use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt::Display;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
    /// Progress goes through the `log` facade instead of stderr.
    Log,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
    disable_pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool, disable_pretty: bool) -> Self {
        Self {
            mode,
            is_tty,
            disable_pretty,
        }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool, disable_pretty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            Some("log") => UiMode::Log,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty, disable_pretty)
    }

    fn use_pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty => true,
                UiMode::Auto => !self.disable_pretty,
                UiMode::Plain | UiMode::Log => false,
            }
    }

    /// Batch events should be handed to a log reporter rather than rendered.
    pub fn logs_progress(&self) -> bool {
        matches!(self.mode, UiMode::Log)
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        let sink = if self.logs_progress() {
            log::info!("{}", name);
            StageSink::Log
        } else if self.use_pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageSink::Spinner(spinner)
        } else {
            eprintln!("==> {}", name);
            StageSink::Stderr
        };
        StageGuard {
            name: name.to_string(),
            start: Instant::now(),
            sink,
        }
    }

    /// Per-file progress for a batch of `total` videos.
    pub fn batch(&self, total: usize) -> BatchProgress {
        if self.use_pretty() {
            let bar = ProgressBar::new(total as u64);
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template(
                "{spinner} [{bar:30}] {pos}/{len} {percent:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style.progress_chars("=> "));
            BatchProgress {
                bar: Some(bar),
                start: Instant::now(),
            }
        } else {
            eprintln!("==> Correcting {} videos", total);
            BatchProgress {
                bar: None,
                start: Instant::now(),
            }
        }
    }
}

enum StageSink {
    Spinner(ProgressBar),
    Stderr,
    Log,
}

pub struct StageGuard {
    name: String,
    start: Instant,
    sink: StageSink,
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = format_duration(self.start.elapsed());
        match &self.sink {
            StageSink::Spinner(spinner) => {
                spinner.finish_with_message(format!("✔ {} ({})", self.name, elapsed))
            }
            StageSink::Stderr => eprintln!("✔ {} ({})", self.name, elapsed),
            StageSink::Log => log::info!("{} done in {}", self.name, elapsed),
        }
    }
}

pub struct BatchProgress {
    bar: Option<ProgressBar>,
    start: Instant,
}

impl BatchProgress {
    pub fn file_started(&self, index: usize, total: usize, name: &str) {
        match &self.bar {
            Some(bar) => bar.set_message(name.to_string()),
            None => eprintln!("==> [{}/{}] {}", index + 1, total, name),
        }
    }

    pub fn file_finished(&self, name: &str, outcome: &dyn Display, percent: f64) {
        match &self.bar {
            Some(bar) => {
                bar.println(format!("  {name}: {outcome}"));
                bar.inc(1);
            }
            None => eprintln!("    {name}: {outcome} [{percent:.0}%]"),
        }
    }

    pub fn finish(&self, summary: &dyn Display) {
        let message = format!("✔ {} ({})", summary, format_duration(self.start.elapsed()));
        match &self.bar {
            Some(bar) => bar.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
