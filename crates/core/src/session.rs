//! Form inputs and the reset/rerender state of an interactive session.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    error::{ClipperError, Result},
    pipeline::RunRequest,
    suggest::DEFAULT_PROMPT,
    types::ApiKey,
    video_id::extract_video_id,
    workspace::{CleanupReport, clear_directory},
};

/// The four inputs a run is built from.
#[derive(Debug, Clone)]
pub struct FormInputs {
    pub url: String,
    pub api_key: ApiKey,
    pub destination: String,
    pub prompt: String,
}

impl Default for FormInputs {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: ApiKey::default(),
            destination: "./".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl FormInputs {
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.url.trim().is_empty() {
            missing.push("video URL");
        }
        if self.api_key.is_empty() {
            missing.push("API key");
        }
        if self.destination.trim().is_empty() {
            missing.push("download path");
        }
        missing
    }

    /// Check the inputs and resolve the video id. Touches nothing on disk.
    pub fn to_request(&self) -> Result<RunRequest> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(ClipperError::MissingInputs { missing });
        }

        let video_id = extract_video_id(&self.url)?;
        Ok(RunRequest {
            url: self.url.trim().to_string(),
            video_id,
            destination: PathBuf::from(self.destination.trim()),
            prompt: self.prompt.clone(),
        })
    }
}

/// Clear the destination directory on explicit request.
pub async fn reset_destination(destination: &str) -> Result<CleanupReport> {
    let destination = destination.trim();
    if destination.is_empty() {
        return Err(ClipperError::MissingDestination);
    }

    let report = clear_directory(Path::new(destination)).await;
    info!(
        removed = report.removed.len(),
        failed = report.failures.len(),
        "destination reset"
    );
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// A reset happened; the form must be redrawn before the next action.
    AwaitingRerender,
}

#[derive(Debug, Default)]
pub struct Session {
    pub form: FormInputs,
    state: SessionState,
}

impl Session {
    pub fn new(form: FormInputs) -> Self {
        Self {
            form,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Clear the destination directory and mark the form for redraw.
    pub async fn reset(&mut self) -> Result<CleanupReport> {
        let report = reset_destination(&self.form.destination).await?;
        self.state = SessionState::AwaitingRerender;
        Ok(report)
    }

    /// Redraw after a reset: URL and prompt go back to their defaults, the
    /// credential and download path are kept. Returns whether anything changed.
    pub fn rerender(&mut self) -> bool {
        if self.state != SessionState::AwaitingRerender {
            return false;
        }

        let defaults = FormInputs::default();
        self.form.url = defaults.url;
        self.form.prompt = defaults.prompt;
        self.state = SessionState::Idle;
        true
    }
}
