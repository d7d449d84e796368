use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

/// One caption unit as returned by the transcript service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// A (start, end) pair in seconds, parsed from the model's reply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestedClip {
    pub start: f64,
    pub end: f64,
}

impl SuggestedClip {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl From<(f64, f64)> for SuggestedClip {
    fn from((start, end): (f64, f64)) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for SuggestedClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// A clip written to the destination directory. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipFile {
    pub path: PathBuf,
    pub index: usize,
    pub clip: SuggestedClip,
}

/// A parsed clip that validation refused to cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedClip {
    pub clip: SuggestedClip,
    pub reason: String,
}

/// Everything one suggestion run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub video_id: String,
    pub transcript_len: usize,
    pub suggested: Vec<SuggestedClip>,
    pub rejected: Vec<RejectedClip>,
    pub video: Option<PathBuf>,
    pub clips: Vec<ClipFile>,
}

/// LLM credential. Never printed.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_redacted() {
        let key = ApiKey::new("sk-secret");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.to_string(), "***");
        assert_eq!(key.expose(), "sk-secret");
    }

    #[test]
    fn suggested_clip_displays_as_pair() {
        assert_eq!(SuggestedClip::new(0.0, 10.5).to_string(), "(0, 10.5)");
    }
}
