use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    format::join_segments,
    types::{Segment, VideoId},
};

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube returned HTTP {status} for {video_id}")]
    Status { video_id: String, status: u16 },

    #[error("YouTube returned HTTP {status} for the {language_code} track")]
    TrackStatus { language_code: String, status: u16 },

    #[error("YouTube is blocking requests from this IP (video {0})")]
    IpBlocked(String),

    #[error("Could not parse YouTube page data for {0}")]
    Unparsable(String),

    #[error("Video {video_id} is unplayable: {reason}")]
    Unplayable { video_id: String, reason: String },
}

/// One caption track offered for a video.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptTrack {
    pub language_code: String,
    pub language: String,
    pub is_generated: bool,
    pub base_url: String,
}

/// Tracks of one video, manually created ones first, each group in listing order.
#[derive(Clone, Debug)]
pub struct TranscriptList {
    video_id: VideoId,
    tracks: Vec<TranscriptTrack>,
}

impl TranscriptList {
    pub fn new(video_id: VideoId, mut tracks: Vec<TranscriptTrack>) -> Self {
        tracks.sort_by_key(|track| track.is_generated);
        Self { video_id, tracks }
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn tracks(&self) -> &[TranscriptTrack] {
        &self.tracks
    }

    /// First track matching the language codes in priority order.
    /// For each code a manually created track beats a generated one.
    pub fn find(&self, language_codes: &[&str]) -> Option<&TranscriptTrack> {
        language_codes.iter().find_map(|code| {
            self.tracks
                .iter()
                .find(|track| track.language_code == *code)
        })
    }

    pub fn first(&self) -> Option<&TranscriptTrack> {
        self.tracks.first()
    }
}

pub enum TranscriptListing {
    Disabled,
    Tracks(TranscriptList),
}

/// Source of transcript listings and timed text.
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    async fn list(&self, video_id: &VideoId) -> Result<TranscriptListing, TranscriptError>;

    async fn fetch(&self, track: &TranscriptTrack) -> Result<Vec<Segment>, TranscriptError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum TranscriptOutcome {
    /// Transcripts are disabled for the video, or it has no tracks at all.
    Disabled,
    Fetched { text: String, language_code: String },
    FetchError { message: String },
}

/// List the tracks of `video_id`, pick the `preferred_language` track (or the
/// first listed one) and join its text.
pub async fn fetch_transcript(
    api: &dyn TranscriptApi,
    video_id: &VideoId,
    preferred_language: &str,
) -> TranscriptOutcome {
    let list = match api.list(video_id).await {
        Ok(TranscriptListing::Tracks(list)) => list,
        Ok(TranscriptListing::Disabled) => return TranscriptOutcome::Disabled,
        Err(e) => return fetch_error(video_id, e),
    };

    let track = match list.find(&[preferred_language]) {
        Some(track) => track,
        None => match list.first() {
            Some(track) => {
                debug!(
                    %video_id,
                    language = %track.language_code,
                    "no {} track, falling back to first listed",
                    preferred_language
                );
                track
            }
            None => return TranscriptOutcome::Disabled,
        },
    };

    match api.fetch(track).await {
        Ok(segments) => TranscriptOutcome::Fetched {
            text: join_segments(&segments),
            language_code: track.language_code.clone(),
        },
        Err(e) => fetch_error(video_id, e),
    }
}

fn fetch_error(video_id: &VideoId, error: TranscriptError) -> TranscriptOutcome {
    warn!(%video_id, error = %error, "transcript retrieval failed");
    TranscriptOutcome::FetchError {
        message: error.to_string(),
    }
}
