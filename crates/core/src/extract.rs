use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{
    error::{ClipperError, Result},
    types::SuggestedClip,
};

#[async_trait]
pub trait ClipExtractor: Send + Sync {
    /// Cut `[clip.start, clip.end)` out of `source` into `output`.
    async fn extract(&self, source: &Path, clip: &SuggestedClip, output: &Path) -> Result<()>;
}

/// `clip_<index>.mp4` inside `dest_dir`, index 1-based.
pub fn clip_path(dest_dir: &Path, index: usize) -> PathBuf {
    dest_dir.join(format!("clip_{index}.mp4"))
}

/// Subclip extraction with ffmpeg stream copy (no re-encode)
pub struct FfmpegExtractor {
    program: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, source: &Path, clip: &SuggestedClip, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-ss")
            .arg(format!("{:.3}", clip.start))
            .arg("-i")
            .arg(source)
            .arg("-t")
            .arg(format!("{:.3}", clip.duration()))
            .arg("-map")
            .arg("0")
            .arg("-c")
            .arg("copy")
            .arg(output)
            .kill_on_drop(true);
        command
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Reject ranges ffmpeg cannot cut.
pub fn check_range(clip: &SuggestedClip) -> std::result::Result<(), String> {
    if !clip.start.is_finite() || !clip.end.is_finite() {
        return Err(format!("time range {clip} is not finite"));
    }
    if clip.start < 0.0 {
        return Err(format!("time range {clip} starts before 0"));
    }
    if clip.end <= clip.start {
        return Err(format!("time range {clip} ends before it starts"));
    }
    Ok(())
}

#[async_trait]
impl ClipExtractor for FfmpegExtractor {
    async fn extract(&self, source: &Path, clip: &SuggestedClip, output: &Path) -> Result<()> {
        let failed = |reason: String| ClipperError::ExtractionFailed {
            output: output.to_path_buf(),
            reason,
        };

        check_range(clip).map_err(failed)?;
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(failed(format!("source {} is not readable", source.display())));
        }

        debug!(source = %source.display(), output = %output.display(), %clip, "running ffmpeg");
        let output_status = self
            .command(source, clip, output)
            .output()
            .await
            .map_err(|e| failed(format!("could not run {}: {e}", self.program.display())))?;

        if !output_status.status.success() {
            return Err(failed(
                String::from_utf8_lossy(&output_status.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}
