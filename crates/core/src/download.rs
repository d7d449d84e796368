use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ClipperError, Result};

/// A single progressive (audio+video) mp4 stream.
pub const PROGRESSIVE_MP4: &str = "best[ext=mp4][vcodec!=none][acodec!=none]";

#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Download `url` into `dest_dir`, returning the path of the written file.
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf>;
}

/// Download a video with yt-dlp
pub struct YtDlpDownloader {
    program: PathBuf,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, url: &str, dest_dir: &Path) -> Command {
        let output_template = dest_dir.join("%(title)s.%(ext)s");
        let mut command = Command::new(&self.program);
        command
            .arg(url)
            .arg("--no-playlist")
            .arg("--no-progress")
            .arg("--print")
            .arg("after_move:filepath")
            .arg("-f")
            .arg(PROGRESSIVE_MP4)
            .arg("-o")
            .arg(&output_template)
            .kill_on_drop(true);
        command
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl VideoDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        let failed = |reason: String| ClipperError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        debug!(program = %self.program.display(), url, "running yt-dlp");
        let output = self
            .command(url, dest_dir)
            .output()
            .await
            .map_err(|e| failed(format!("could not run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            return Err(failed(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }

        let stdout_str = String::from_utf8_lossy(output.stdout.as_slice());
        let filepath = stdout_str
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or_else(|| failed("yt-dlp did not report an output file".to_string()))?;

        Ok(PathBuf::from(filepath))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_selects_progressive_mp4() {
        let downloader = YtDlpDownloader::default();
        let command = downloader.command("https://youtu.be/EorJ8cEzsZo", Path::new("/tmp/out"));
        let args: Vec<String> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0], "https://youtu.be/EorJ8cEzsZo");
        let format_at = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[format_at + 1], PROGRESSIVE_MP4);
        assert!(args.contains(&"/tmp/out/%(title)s.%(ext)s".to_string()));
    }

    #[tokio::test]
    async fn missing_binary_is_download_failed() {
        let downloader = YtDlpDownloader::new("/nonexistent/yt-dlp");
        let err = downloader
            .download("https://youtu.be/EorJ8cEzsZo", Path::new("."))
            .await
            .unwrap_err();
        assert!(matches!(err, ClipperError::DownloadFailed { .. }));
    }
}
