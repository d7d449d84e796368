use std::time::{Duration, Instant};

use clipper_core::{CleanupReport, PipelineEvent, ProgressSink, Stage, format_clip_list};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let total = secs.round() as u64;
        format!("{}m {}s", total / 60, total % 60)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn print_failures(report: &CleanupReport) {
    for failure in &report.failures {
        eprintln!("{} {}", style("Error:").red().bold(), failure);
    }
}

fn check() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}

/// Spinner per stage, one summary line when it finishes.
pub struct TerminalProgress {
    spinner: Option<ProgressBar>,
    stage: Option<Stage>,
    step_start: Instant,
    total_start: Instant,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            spinner: None,
            stage: None,
            step_start: Instant::now(),
            total_start: Instant::now(),
        }
    }

    fn start(&mut self, stage: Stage) {
        let msg = match stage {
            Stage::Cleanup => "Clearing download path...".to_string(),
            Stage::Transcript => "Fetching transcript...".to_string(),
            Stage::Suggestion => "Analyzing transcript...".to_string(),
            Stage::Download => "Downloading video...".to_string(),
            Stage::Extraction(index) => format!("Creating clip {index}..."),
        };
        self.stage = Some(stage);
        self.step_start = Instant::now();
        self.spinner = Some(create_spinner(&msg));
    }

    fn finish(&mut self, msg: String) {
        let line = format!(
            "{} {}",
            msg,
            style(format!("[{}]", format_duration(self.step_start.elapsed()))).dim()
        );
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(line),
            None => println!("{line}"),
        }
        self.stage = None;
    }

    /// Close the running spinner after an aborted run.
    pub fn fail(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            let stage = self
                .stage
                .take()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "step".to_string());
            spinner.abandon_with_message(format!("{} {} failed", style("✗").red().bold(), stage));
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn on_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted(stage) => self.start(stage),
            PipelineEvent::CleanupFinished(report) => {
                self.finish(format!(
                    "{} Cleared download path ({} files removed)",
                    check(),
                    report.removed.len()
                ));
                print_failures(&report);
            }
            PipelineEvent::TranscriptFetched { entries } => {
                self.finish(format!("{} Transcript: {} entries", check(), entries));
            }
            PipelineEvent::ClipsSuggested(clips) => {
                self.finish(format!(
                    "{} Suggested clips (start_time, end_time):",
                    check()
                ));
                if clips.is_empty() {
                    println!("   {}", style("none").dim());
                } else {
                    for line in format_clip_list(&clips).lines() {
                        println!("   {line}");
                    }
                }
            }
            PipelineEvent::ClipsRejected(rejected) => {
                for r in rejected {
                    println!(
                        "   {} skipping {}: {}",
                        style("!").yellow().bold(),
                        r.clip,
                        r.reason
                    );
                }
            }
            PipelineEvent::VideoDownloaded(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.finish(format!(
                    "{} Downloaded video: {}",
                    check(),
                    style(name).dim()
                ));
            }
            PipelineEvent::ClipCreated(file) => {
                self.finish(format!(
                    "{} Created clip: {}",
                    check(),
                    style(file.path.display()).cyan()
                ));
            }
            PipelineEvent::Finished => {
                if let Some(spinner) = self.spinner.take() {
                    spinner.finish_and_clear();
                }
                println!(
                    "\n{} {}\n",
                    style("Total time:").dim(),
                    style(format_duration(self.total_start.elapsed()))
                        .cyan()
                        .bold()
                );
            }
        }
    }
}
