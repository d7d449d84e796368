use std::path::Path;

use anyhow::Result;
use clipper_core::{
    CleanupReport, ClipperConfig, FormInputs, Pipeline, RunOutcome, reset_destination,
};
use console::style;
use tokio::process::Command;
use tracing::warn;

use crate::progress::{TerminalProgress, print_failures};

pub struct SuggestOptions {
    pub json: bool,
    pub play: bool,
}

/// Run the whole pipeline for one filled-in form.
pub async fn suggest(
    form: &FormInputs,
    config: &ClipperConfig,
    options: &SuggestOptions,
) -> Result<RunOutcome> {
    // gate before anything touches the download path
    let request = form.to_request()?;
    let pipeline = Pipeline::from_config(config.clone(), form.api_key.clone())?;

    let outcome = if options.json {
        pipeline.run(&request, &mut ()).await?
    } else {
        println!(
            "{} {} {}",
            style("Using").dim(),
            style(config.provider.name()).yellow(),
            style(format!("({})", config.model())).dim()
        );
        let mut progress = TerminalProgress::new();
        match pipeline.run(&request, &mut progress).await {
            Ok(outcome) => outcome,
            Err(e) => {
                progress.fail();
                return Err(e.into());
            }
        }
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        present(&outcome);
    }

    if options.play {
        for clip in &outcome.clips {
            play(&clip.path);
        }
    }

    Ok(outcome)
}

fn present(outcome: &RunOutcome) {
    if outcome.clips.is_empty() {
        println!("{}", style("No clips were generated.").yellow());
        return;
    }

    println!("{}", style("Generated Clips:").bold());
    for clip in &outcome.clips {
        println!(
            "  {}. {}  {}",
            clip.index,
            style(clip.path.display()).cyan(),
            style(clip.clip).dim()
        );
    }
}

/// Delete every file in the download path.
pub async fn reset(destination: &str) -> Result<()> {
    let report = reset_destination(destination).await?;
    report_cleanup(&report);
    Ok(())
}

pub fn report_cleanup(report: &CleanupReport) {
    print_failures(report);
    if report.is_clean() {
        println!(
            "{} All files deleted. {}",
            style("✓").green().bold(),
            style(format!("({} removed)", report.removed.len())).dim()
        );
    } else {
        println!(
            "{} {} files deleted, {} could not be removed.",
            style("!").yellow().bold(),
            report.removed.len(),
            report.failures.len()
        );
    }
}

/// Hand a clip to the platform's default player.
fn play(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };

    if let Err(e) = command.arg(path).spawn() {
        warn!(path = %path.display(), error = %e, "could not open clip");
        eprintln!(
            "{} could not open {}: {}",
            style("!").yellow().bold(),
            path.display(),
            e
        );
    }
}
