//! Transcript retrieval from YouTube caption tracks.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{ClipperError, Result},
    types::TranscriptEntry,
};

const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse = ";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static TEXT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<text\b([^>]*?)(?:/>|>([\s\S]*?)</text>)").expect("valid regex"));
static START_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bstart="([^"]+)""#).expect("valid regex"));
static DUR_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bdur="([^"]+)""#).expect("valid regex"));
static INNER_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Ordered caption entries for `video_id`.
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptEntry>>;
}

pub struct YoutubeTranscriptClient {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<String>,
}

impl YoutubeTranscriptClient {
    pub fn new(languages: Vec<String>) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: "https://www.youtube.com".to_string(),
            languages,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_player_response(&self, video_id: &str) -> std::result::Result<Value, String> {
        let html = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?
            .text()
            .await
            .map_err(|e| e.to_string())?;

        extract_player_response(&html).ok_or_else(|| "player data not found in watch page".to_string())
    }

    async fn fetch_track(&self, base_url: &str) -> std::result::Result<String, String> {
        let url = base_url.replace("&fmt=srv3", "");
        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?
            .text()
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptClient {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptEntry>> {
        let unavailable = |reason: String| ClipperError::TranscriptUnavailable {
            video_id: video_id.to_string(),
            reason,
        };

        let player = self.fetch_player_response(video_id).await.map_err(unavailable)?;

        let status = player["playabilityStatus"]["status"].as_str().unwrap_or("OK");
        if status != "OK" {
            let reason = player["playabilityStatus"]["reason"]
                .as_str()
                .unwrap_or("video unavailable");
            return Err(unavailable(format!("{status}: {reason}")));
        }

        let base_url = select_track(&player, &self.languages)
            .ok_or_else(|| unavailable("transcripts are disabled for this video".to_string()))?;
        debug!(video_id, track = %base_url, "fetching caption track");

        let xml = self.fetch_track(&base_url).await.map_err(unavailable)?;
        let entries = parse_timedtext(&xml);
        debug!(video_id, entries = entries.len(), "caption track parsed");

        Ok(entries)
    }
}

/// Pull the `ytInitialPlayerResponse` object out of a watch page.
pub fn extract_player_response(html: &str) -> Option<Value> {
    let start = html.find(PLAYER_RESPONSE_MARKER)? + PLAYER_RESPONSE_MARKER.len();
    serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<Value>()
        .next()?
        .ok()
}

/// Caption track URL for the first preferred language, manual tracks before
/// auto-generated ones, otherwise the first track listed.
pub fn select_track(player: &Value, languages: &[String]) -> Option<String> {
    let tracks = player["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"].as_array()?;

    fn matches_lang(track: &Value, lang: &str) -> bool {
        track["languageCode"]
            .as_str()
            .is_some_and(|code| code == lang || code.starts_with(&format!("{lang}-")))
    }

    fn is_generated(track: &Value) -> bool {
        track["kind"].as_str() == Some("asr")
    }

    let preferred = languages.iter().find_map(|lang| {
        tracks
            .iter()
            .filter(|track| matches_lang(track, lang))
            .min_by_key(|track| is_generated(track))
    });

    preferred
        .or_else(|| tracks.first())
        .and_then(|track| track["baseUrl"].as_str())
        .map(str::to_string)
}

/// Parse a timed-text document (`<text start=".." dur="..">..</text>`).
pub fn parse_timedtext(xml: &str) -> Vec<TranscriptEntry> {
    TEXT_ELEMENT
        .captures_iter(xml)
        .filter_map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let start = START_ATTR.captures(attrs)?[1].parse::<f64>().ok()?;
            let duration = DUR_ATTR
                .captures(attrs)
                .and_then(|c| c[1].parse::<f64>().ok())
                .unwrap_or(0.0);

            let raw = caps.get(2).map_or("", |m| m.as_str());
            let text = decode_caption_text(raw);
            if text.is_empty() {
                return None;
            }

            Some(TranscriptEntry {
                text,
                start,
                duration,
            })
        })
        .collect()
}

// Captions arrive entity-encoded, often twice (`&amp;#39;`).
fn decode_caption_text(raw: &str) -> String {
    let once = html_escape::decode_html_entities(raw);
    let twice = html_escape::decode_html_entities(&once);
    let plain = INNER_TAG.replace_all(&twice, "");
    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    const TIMEDTEXT: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="2.1">welcome to the</text><text start="2.6" dur="3">Hall of Science &amp;amp; friends</text><text start="5.6" dur="1"></text><text start="7" dur="1.5">it&amp;#39;s
great</text></transcript>"#;

    fn watch_page(player: &Value) -> String {
        format!(
            "<html><script>var ytInitialPlayerResponse = {};var meta = {{}};</script></html>",
            player
        )
    }

    #[test]
    fn parses_and_decodes_timedtext() {
        let entries = parse_timedtext(TIMEDTEXT);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].text, "welcome to the");
        assert_eq!(entries[0].start, 0.5);
        assert_eq!(entries[0].duration, 2.1);
        assert_eq!(entries[1].text, "Hall of Science & friends");
        assert_eq!(entries[2].text, "it's great");
        assert_eq!(entries[2].start, 7.0);
    }

    #[test]
    fn extracts_player_response_with_trailing_script() {
        let player = serde_json::json!({"playabilityStatus": {"status": "OK"}, "note": "a;b}"});
        let parsed = extract_player_response(&watch_page(&player)).unwrap();
        assert_eq!(parsed, player);
        assert!(extract_player_response("<html></html>").is_none());
    }

    #[test]
    fn prefers_manual_track_in_requested_language() {
        let player = serde_json::json!({
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                {"baseUrl": "https://x/de", "languageCode": "de"},
                {"baseUrl": "https://x/en-asr", "languageCode": "en", "kind": "asr"},
                {"baseUrl": "https://x/en-us", "languageCode": "en-US"},
            ]}}
        });
        let langs = vec!["en".to_string()];
        assert_eq!(select_track(&player, &langs).as_deref(), Some("https://x/en-us"));

        let langs = vec!["fr".to_string()];
        assert_eq!(select_track(&player, &langs).as_deref(), Some("https://x/de"));

        assert!(select_track(&serde_json::json!({}), &langs).is_none());
    }

    #[tokio::test]
    async fn fetches_transcript_from_watch_page() {
        let server = MockServer::start().await;
        let player = serde_json::json!({
            "playabilityStatus": {"status": "OK"},
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                {"baseUrl": format!("{}/api/timedtext?v=abc", server.uri()), "languageCode": "en"}
            ]}}
        });

        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "EorJ8cEzsZo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(watch_page(&player)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TIMEDTEXT))
            .mount(&server)
            .await;

        let client = YoutubeTranscriptClient::new(vec!["en".to_string()])
            .unwrap()
            .with_base_url(server.uri());
        let entries = client.fetch("EorJ8cEzsZo").await.unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].text, "Hall of Science & friends");
    }

    #[tokio::test]
    async fn missing_captions_is_transcript_unavailable() {
        let server = MockServer::start().await;
        let player = serde_json::json!({"playabilityStatus": {"status": "OK"}});

        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(watch_page(&player)))
            .mount(&server)
            .await;

        let client = YoutubeTranscriptClient::new(vec!["en".to_string()])
            .unwrap()
            .with_base_url(server.uri());
        let err = client.fetch("EorJ8cEzsZo").await.unwrap_err();

        match err {
            ClipperError::TranscriptUnavailable { video_id, reason } => {
                assert_eq!(video_id, "EorJ8cEzsZo");
                assert!(reason.contains("disabled"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unplayable_video_reports_status() {
        let server = MockServer::start().await;
        let player = serde_json::json!({
            "playabilityStatus": {"status": "ERROR", "reason": "Video unavailable"}
        });

        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(watch_page(&player)))
            .mount(&server)
            .await;

        let client = YoutubeTranscriptClient::new(vec![])
            .unwrap()
            .with_base_url(server.uri());
        let err = client.fetch("EorJ8cEzsZo").await.unwrap_err();
        assert!(err.to_string().contains("ERROR: Video unavailable"));
    }
}
