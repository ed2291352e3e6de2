pub mod error;
pub mod format;
pub mod pipeline;
pub mod provider;
pub mod render;
pub mod summarize;
pub mod transcript;
pub mod translate;
pub mod types;
pub mod video_id;
pub mod youtube;

pub use error::{RecapError, Result};
pub use format::{DEFAULT_MAX_WORDS, truncate_words};
pub use pipeline::{AnalysisFailure, Analyzer, AnalyzerConfig, Progress, Stage, TARGET_LANGUAGE};
pub use provider::{Provider, ProviderConfig};
pub use summarize::{ChatSummarizer, Summarizer, SummarizerConfig};
pub use transcript::{TranscriptApi, TranscriptError, TranscriptOutcome, fetch_transcript};
pub use translate::{GoogleTranslateClient, TranslateError, Translator};
pub use types::{Analysis, LocalizedTranscript, Segment, VideoId};
pub use video_id::extract_video_id;
pub use youtube::YoutubeTranscriptClient;
