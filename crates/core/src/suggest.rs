//! Clip suggestion: prompt construction, the chat-completion call, and
//! parsing the model's free-form reply into (start, end) pairs.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{ClipperError, Result},
    format::format_transcript_block,
    provider::Provider,
    types::{ApiKey, RejectedClip, SuggestedClip, TranscriptEntry},
};

pub const SYSTEM_PROMPT: &str =
    "You are an assistant that helps suggest interesting clips from a YouTube video transcript.";

static FORMAT_TEMPLATE: &str = r#"
Provide the start and end times for each clip in the following format:

Clip 1:
- Start time: ss
- End time: ss
- Transcript: "..."

Clip 2:
- Start time: ss
- End time: ss
- Transcript: "..."

"#;

/// Prompt used when the user does not supply one.
pub const DEFAULT_PROMPT: &str = r#"Analyze the YouTube video and suggest 2 segments for clips that mention "Hall of Science"

Make sure the clips do not repeat and are only 10 seconds long."#;

// seconds (`12`, `12.5`, `.5`) or clock form (`01:05`, `1:02:03.5`)
const TIME_VALUE: &str = r"(\d*\.\d+|\d+(?::\d{1,2}){0,2}(?:\.\d+)?)";

static START_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"Start time:\s*{TIME_VALUE}")).expect("valid regex"));

static END_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"End time:\s*{TIME_VALUE}")).expect("valid regex"));

static CLIP_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\s#>*-]*Clip\s+\d+\b").expect("valid regex"));

/// How start and end markers are matched up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingStrategy {
    /// i-th start with i-th end; extras on the longer side are dropped.
    #[default]
    Positional,
    /// One pair per `Clip N` block, blocks missing a marker are skipped.
    /// Replies without `Clip N` headings fall back to positional pairing.
    ClipBlocks,
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send a single system + user exchange, return the first choice's text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: ApiKey,
}

impl OpenAiChat {
    pub fn new(provider: &Provider, model: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: provider.config().api_url.to_string(),
            model: model.into(),
            api_key,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let failed = |reason: String| ClipperError::SuggestionFailed { reason };

        debug!(model = %self.model, prompt_bytes = user.len(), "sending chat completion");

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": system,
                    },
                    {
                        "role": "user",
                        "content": user,
                    },
                ],
            }))
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| failed(format!("{status}: unreadable response body: {e}")))?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            return Err(failed(format!("{status}: {message}")));
        }

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| failed(format!("Invalid API response: {body}")))
    }
}

/// The user message: instruction, then the reply format, then the transcript.
pub fn build_user_message(prompt: &str, transcript: &[TranscriptEntry]) -> String {
    format!(
        "{}{}Transcript: {}",
        prompt,
        FORMAT_TEMPLATE,
        format_transcript_block(transcript)
    )
}

/// Ask the model for clips and parse its reply.
pub async fn suggest_clips(
    chat: &dyn ChatCompletion,
    transcript: &[TranscriptEntry],
    prompt: &str,
    pairing: PairingStrategy,
) -> Result<Vec<SuggestedClip>> {
    let user_message = build_user_message(prompt, transcript);
    let reply = chat.complete(SYSTEM_PROMPT, &user_message).await?;
    debug!(reply_bytes = reply.len(), "model replied");

    Ok(parse_reply(&reply, pairing))
}

pub fn parse_reply(reply: &str, pairing: PairingStrategy) -> Vec<SuggestedClip> {
    let content = reply.replace("**", "");

    match pairing {
        PairingStrategy::Positional => pair_positionally(&content),
        PairingStrategy::ClipBlocks => {
            let headings: Vec<usize> = CLIP_HEADING.find_iter(&content).map(|m| m.start()).collect();
            if headings.is_empty() {
                debug!("no clip headings in reply, pairing positionally");
                return pair_positionally(&content);
            }
            pair_by_block(&content, &headings)
        }
    }
}

fn pair_positionally(content: &str) -> Vec<SuggestedClip> {
    let starts = capture_times(&START_TIME, content);
    let ends = capture_times(&END_TIME, content);

    if starts.len() != ends.len() {
        debug!(
            starts = starts.len(),
            ends = ends.len(),
            "unbalanced time markers, extra markers dropped"
        );
    }

    starts
        .into_iter()
        .zip(ends)
        .map(SuggestedClip::from)
        .collect()
}

fn pair_by_block(content: &str, headings: &[usize]) -> Vec<SuggestedClip> {
    let bounds = headings
        .iter()
        .copied()
        .zip(headings.iter().skip(1).copied().chain([content.len()]));

    bounds
        .filter_map(|(from, to)| {
            let block = &content[from..to];
            let start = capture_times(&START_TIME, block).first().copied();
            let end = capture_times(&END_TIME, block).first().copied();
            match (start, end) {
                (Some(start), Some(end)) => Some(SuggestedClip::new(start, end)),
                _ => {
                    debug!(block = block.trim(), "clip block without both times skipped");
                    None
                }
            }
        })
        .collect()
}

fn capture_times(re: &Regex, content: &str) -> Vec<f64> {
    re.captures_iter(content)
        .filter_map(|caps| parse_time_value(&caps[1]))
        .collect()
}

/// `"12.5"` → 12.5, `"01:05"` → 65.0, `"1:00:30"` → 3630.0
pub fn parse_time_value(value: &str) -> Option<f64> {
    value.split(':').try_fold(0.0, |acc, part| {
        part.parse::<f64>().ok().map(|v| acc * 60.0 + v)
    })
}

/// Split parsed clips into ones worth cutting and ones that are not.
pub fn validate_clips(clips: Vec<SuggestedClip>) -> (Vec<SuggestedClip>, Vec<RejectedClip>) {
    let mut accepted = Vec::with_capacity(clips.len());
    let mut rejected = Vec::new();

    for clip in clips {
        let reason = if !clip.start.is_finite() || !clip.end.is_finite() {
            Some("time is not a finite number")
        } else if clip.end <= clip.start {
            Some("end time is not after start time")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                warn!(start = clip.start, end = clip.end, reason, "rejecting suggested clip");
                rejected.push(RejectedClip {
                    clip,
                    reason: reason.to_string(),
                });
            }
            None => accepted.push(clip),
        }
    }

    (accepted, rejected)
}
