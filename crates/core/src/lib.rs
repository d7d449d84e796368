//! Clipper Core Library
//!
//! Fetches a YouTube transcript, asks a chat-completion model for highlight
//! segments, downloads the video and cuts the suggested clips.

pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod format;
pub mod pipeline;
pub mod provider;
pub mod session;
pub mod suggest;
pub mod transcript;
pub mod types;
pub mod video_id;
pub mod workspace;

// Re-export commonly used items at crate root
pub use config::{ClipperConfig, Timeouts};
pub use error::{ClipperError, FileDeletionError, Result};
pub use format::{format_clip_list, format_timestamp, format_transcript_block};
pub use pipeline::{Pipeline, PipelineEvent, ProgressSink, RunRequest, Stage};
pub use provider::{Provider, ProviderConfig};
pub use session::{FormInputs, Session, SessionState, reset_destination};
pub use suggest::{DEFAULT_PROMPT, PairingStrategy, parse_reply};
pub use types::{ApiKey, ClipFile, RejectedClip, RunOutcome, SuggestedClip, TranscriptEntry};
pub use video_id::extract_video_id;
pub use workspace::{CleanupReport, clear_directory};
