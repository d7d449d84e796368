use std::{path::PathBuf, time::Duration};

use serde::Serialize;
use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Error, Debug)]
pub enum ClipperError {
    #[error("Please provide all required inputs (missing: {})", missing.join(", "))]
    MissingInputs { missing: Vec<&'static str> },

    #[error("Please provide the download path.")]
    MissingDestination,

    #[error("Could not find a video id in {url}")]
    InvalidUrl { url: String },

    #[error("Transcript unavailable for {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Clip suggestion failed: {reason}")]
    SuggestionFailed { reason: String },

    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Clip extraction failed for {output}: {reason}")]
    ExtractionFailed { output: PathBuf, reason: String },

    #[error("{stage} timed out after {}s", after.as_secs())]
    Timeout { stage: Stage, after: Duration },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClipperError>;

/// A file in the destination directory that could not be removed.
///
/// Never aborts a cleanup; collected into [`crate::workspace::CleanupReport`].
#[derive(Error, Debug, Clone, Serialize)]
#[error("Error deleting file {}: {reason}", path.display())]
pub struct FileDeletionError {
    pub path: PathBuf,
    pub reason: String,
}
