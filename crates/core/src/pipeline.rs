//! One suggestion run: cleanup → transcript → suggestion → download → extraction.
//!
//! Stages run strictly in order and every external call gets one attempt under
//! its own deadline. The first failure ends the run; files already written stay
//! in the destination directory until the next cleanup.

use std::{fmt, future::Future, path::PathBuf, time::Duration};

use tokio::fs;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::{
    config::ClipperConfig,
    download::{VideoDownloader, YtDlpDownloader},
    error::{ClipperError, Result},
    extract::{ClipExtractor, FfmpegExtractor, clip_path},
    suggest::{ChatCompletion, OpenAiChat, suggest_clips, validate_clips},
    transcript::{TranscriptSource, YoutubeTranscriptClient},
    types::{ApiKey, ClipFile, RejectedClip, RunOutcome, SuggestedClip},
    workspace::{CleanupReport, clear_directory},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cleanup,
    Transcript,
    Suggestion,
    Download,
    /// 1-based clip index
    Extraction(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Cleanup => f.write_str("cleanup"),
            Stage::Transcript => f.write_str("transcript fetch"),
            Stage::Suggestion => f.write_str("clip suggestion"),
            Stage::Download => f.write_str("video download"),
            Stage::Extraction(index) => write!(f, "clip {index} extraction"),
        }
    }
}

/// Validated inputs for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub url: String,
    pub video_id: String,
    pub destination: PathBuf,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageStarted(Stage),
    CleanupFinished(CleanupReport),
    TranscriptFetched { entries: usize },
    ClipsSuggested(Vec<SuggestedClip>),
    ClipsRejected(Vec<RejectedClip>),
    VideoDownloaded(PathBuf),
    ClipCreated(ClipFile),
    Finished,
}

/// Receives progress while a run is in flight.
pub trait ProgressSink {
    fn on_event(&mut self, event: PipelineEvent);
}

impl ProgressSink for Vec<PipelineEvent> {
    fn on_event(&mut self, event: PipelineEvent) {
        self.push(event);
    }
}

impl ProgressSink for () {
    fn on_event(&mut self, _event: PipelineEvent) {}
}

pub struct Pipeline {
    transcripts: Box<dyn TranscriptSource>,
    chat: Box<dyn ChatCompletion>,
    downloader: Box<dyn VideoDownloader>,
    extractor: Box<dyn ClipExtractor>,
    config: ClipperConfig,
}

impl Pipeline {
    pub fn new(
        transcripts: Box<dyn TranscriptSource>,
        chat: Box<dyn ChatCompletion>,
        downloader: Box<dyn VideoDownloader>,
        extractor: Box<dyn ClipExtractor>,
        config: ClipperConfig,
    ) -> Self {
        Self {
            transcripts,
            chat,
            downloader,
            extractor,
            config,
        }
    }

    /// The production wiring: YouTube captions, an OpenAI-compatible chat
    /// endpoint, yt-dlp and ffmpeg.
    pub fn from_config(config: ClipperConfig, api_key: ApiKey) -> Result<Self> {
        let transcripts = YoutubeTranscriptClient::new(config.languages.clone())?;
        let chat = OpenAiChat::new(&config.provider, config.model(), api_key);
        let downloader = YtDlpDownloader::new(config.yt_dlp.clone());
        let extractor = FfmpegExtractor::new(config.ffmpeg.clone());

        Ok(Self::new(
            Box::new(transcripts),
            Box::new(chat),
            Box::new(downloader),
            Box::new(extractor),
            config,
        ))
    }

    pub fn config(&self) -> &ClipperConfig {
        &self.config
    }

    pub async fn run(&self, request: &RunRequest, sink: &mut dyn ProgressSink) -> Result<RunOutcome> {
        let span = info_span!("run", run_id = %Uuid::new_v4(), video_id = %request.video_id);
        self.run_stages(request, sink).instrument(span).await
    }

    async fn run_stages(&self, request: &RunRequest, sink: &mut dyn ProgressSink) -> Result<RunOutcome> {
        let timeouts = self.config.timeouts;
        let dest = request.destination.as_path();

        sink.on_event(PipelineEvent::StageStarted(Stage::Cleanup));
        fs::create_dir_all(dest).await?;
        let cleanup = clear_directory(dest).await;
        info!(removed = cleanup.removed.len(), failed = cleanup.failures.len(), "destination cleared");
        sink.on_event(PipelineEvent::CleanupFinished(cleanup));

        sink.on_event(PipelineEvent::StageStarted(Stage::Transcript));
        let transcript = with_deadline(
            Stage::Transcript,
            timeouts.transcript,
            self.transcripts.fetch(&request.video_id),
        )
        .await?;
        if transcript.is_empty() {
            return Err(ClipperError::TranscriptUnavailable {
                video_id: request.video_id.clone(),
                reason: "transcript is empty".to_string(),
            });
        }
        info!(entries = transcript.len(), "transcript fetched");
        sink.on_event(PipelineEvent::TranscriptFetched {
            entries: transcript.len(),
        });

        sink.on_event(PipelineEvent::StageStarted(Stage::Suggestion));
        let suggested = with_deadline(
            Stage::Suggestion,
            timeouts.suggestion,
            suggest_clips(
                self.chat.as_ref(),
                &transcript,
                &request.prompt,
                self.config.pairing,
            ),
        )
        .await?;
        info!(clips = suggested.len(), "clips suggested");
        sink.on_event(PipelineEvent::ClipsSuggested(suggested.clone()));

        let (accepted, rejected) = if self.config.validate {
            validate_clips(suggested.clone())
        } else {
            (suggested.clone(), Vec::new())
        };
        if !rejected.is_empty() {
            sink.on_event(PipelineEvent::ClipsRejected(rejected.clone()));
        }

        let mut outcome = RunOutcome {
            video_id: request.video_id.clone(),
            transcript_len: transcript.len(),
            suggested,
            rejected,
            video: None,
            clips: Vec::new(),
        };

        if accepted.is_empty() {
            info!("nothing to cut, skipping download");
            sink.on_event(PipelineEvent::Finished);
            return Ok(outcome);
        }

        sink.on_event(PipelineEvent::StageStarted(Stage::Download));
        let video = with_deadline(
            Stage::Download,
            timeouts.download,
            self.downloader.download(&request.url, dest),
        )
        .await?;
        info!(video = %video.display(), "video downloaded");
        sink.on_event(PipelineEvent::VideoDownloaded(video.clone()));

        for (i, clip) in accepted.into_iter().enumerate() {
            let index = i + 1;
            let stage = Stage::Extraction(index);
            let output = clip_path(dest, index);

            sink.on_event(PipelineEvent::StageStarted(stage));
            with_deadline(
                stage,
                timeouts.extraction,
                self.extractor.extract(&video, &clip, &output),
            )
            .await?;
            info!(index, output = %output.display(), "clip created");

            let file = ClipFile {
                path: output,
                index,
                clip,
            };
            sink.on_event(PipelineEvent::ClipCreated(file.clone()));
            outcome.clips.push(file);
        }

        outcome.video = Some(video);
        sink.on_event(PipelineEvent::Finished);
        Ok(outcome)
    }
}

async fn with_deadline<T>(
    stage: Stage,
    after: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| ClipperError::Timeout { stage, after })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_read_naturally_in_errors() {
        let err = ClipperError::Timeout {
            stage: Stage::Extraction(2),
            after: Duration::from_secs(600),
        };
        assert_eq!(err.to_string(), "clip 2 extraction timed out after 600s");
        assert_eq!(Stage::Transcript.to_string(), "transcript fetch");
    }

    #[tokio::test]
    async fn deadline_turns_into_timeout_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let err = with_deadline(Stage::Download, Duration::from_millis(10), slow)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClipperError::Timeout {
                stage: Stage::Download,
                ..
            }
        ));
    }
}
