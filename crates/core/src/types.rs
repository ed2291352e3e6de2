use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque YouTube video identifier. Only produced by [`crate::extract_video_id`],
/// so it is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One timed text entry of a transcript track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

/// Transcript text ready for summarization, labelled with the language
/// shown to the user (`"en"`, or `"de (translated)"` after translation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalizedTranscript {
    pub text: String,
    pub language: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Analysis {
    pub video_id: VideoId,
    pub transcript: String,
    pub summary: String,
    pub language: String,
}
