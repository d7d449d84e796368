//! Run configuration.

use std::{path::PathBuf, time::Duration};

use crate::{provider::Provider, suggest::PairingStrategy};

/// Per-stage deadlines. Every external call gets exactly one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeouts {
    pub transcript: Duration,
    pub suggestion: Duration,
    pub download: Duration,
    /// Applied to each clip separately
    pub extraction: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            transcript: Duration::from_secs(30),
            suggestion: Duration::from_secs(180),
            download: Duration::from_secs(1800),
            extraction: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClipperConfig {
    pub provider: Provider,
    /// Overrides the provider's default model
    pub model: Option<String>,
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
    /// Preferred caption languages, in order
    pub languages: Vec<String>,
    pub timeouts: Timeouts,
    pub pairing: PairingStrategy,
    /// Drop inverted or empty ranges before cutting
    pub validate: bool,
}

impl Default for ClipperConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
            languages: vec!["en".to_string()],
            timeouts: Timeouts::default(),
            pairing: PairingStrategy::default(),
            validate: true,
        }
    }
}

impl ClipperConfig {
    /// Defaults overridden by `CLIPPER_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeouts = Timeouts {
            transcript: env_secs("CLIPPER_TRANSCRIPT_TIMEOUT_SECS")
                .unwrap_or(defaults.timeouts.transcript),
            suggestion: env_secs("CLIPPER_SUGGESTION_TIMEOUT_SECS")
                .unwrap_or(defaults.timeouts.suggestion),
            download: env_secs("CLIPPER_DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or(defaults.timeouts.download),
            extraction: env_secs("CLIPPER_EXTRACTION_TIMEOUT_SECS")
                .unwrap_or(defaults.timeouts.extraction),
        };

        Self {
            model: env("CLIPPER_MODEL"),
            yt_dlp: env("CLIPPER_YTDLP")
                .map(PathBuf::from)
                .unwrap_or(defaults.yt_dlp),
            ffmpeg: env("CLIPPER_FFMPEG")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg),
            languages: env("CLIPPER_LANGS")
                .map(|s| parse_languages(&s))
                .filter(|langs| !langs.is_empty())
                .unwrap_or(defaults.languages),
            timeouts,
            ..defaults
        }
    }

    /// The model actually sent to the provider.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.config().model)
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_secs(key: &str) -> Option<Duration> {
    env(key)
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

pub fn parse_languages(s: &str) -> Vec<String> {
    s.split(',')
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_stock_binaries_and_openai() {
        let config = ClipperConfig::default();
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.yt_dlp, PathBuf::from("yt-dlp"));
        assert_eq!(config.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.pairing, PairingStrategy::Positional);
        assert!(config.validate);
    }

    #[test]
    fn explicit_model_wins() {
        let config = ClipperConfig {
            model: Some("gpt-4o-mini".to_string()),
            ..ClipperConfig::default()
        };
        assert_eq!(config.model(), "gpt-4o-mini");
    }

    #[test]
    fn languages_are_comma_separated() {
        assert_eq!(parse_languages(" en, en-US ,,de"), vec!["en", "en-US", "de"]);
        assert!(parse_languages(" , ").is_empty());
    }
}
