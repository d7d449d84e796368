use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ClipperError, Result};

static WATCH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]v=([a-zA-Z0-9_-]+)").expect("valid regex"));

static PATH_FORMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|youtube\.com/(?:shorts|embed|live)/)([a-zA-Z0-9_-]{11})")
        .expect("valid regex")
});

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid regex"));

/// Extract a YouTube video id from a watch URL, a short link, a shorts/embed
/// URL, or a bare id.
pub fn extract_video_id(url: &str) -> Result<String> {
    let input = url.trim();

    if BARE_ID.is_match(input) {
        return Ok(input.to_string());
    }

    WATCH_PARAM
        .captures(input)
        .or_else(|| PATH_FORMS.captures(input))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ClipperError::InvalidUrl {
            url: input.to_string(),
        })
}
