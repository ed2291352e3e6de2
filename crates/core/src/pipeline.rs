use std::{fmt, future::Future, sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    format::{DEFAULT_MAX_WORDS, truncate_words},
    summarize::Summarizer,
    transcript::{TranscriptApi, TranscriptOutcome, fetch_transcript},
    translate::{Translator, localize},
    types::{Analysis, VideoId},
    video_id::extract_video_id,
};

/// Language every summary is produced from.
pub const TARGET_LANGUAGE: &str = "en";

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// An external call of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Transcript,
    Translation,
    Summarization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Transcript => "transcript",
            Stage::Translation => "translation",
            Stage::Summarization => "summarization",
        })
    }
}

/// Why a request ended on the error page. `Display` is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisFailure {
    #[error("Invalid YouTube URL. Please enter a valid link.")]
    InvalidUrl,

    #[error("No transcript available for this video. Ensure subtitles are enabled.")]
    NoTranscript { video_id: VideoId },

    #[error("Error retrieving transcript: {message}")]
    TranscriptFetch { video_id: VideoId, message: String },

    #[error("Translation failed: {message}")]
    TranslationFailed { video_id: VideoId, message: String },

    #[error("Analysis failed due to API limits: {message}")]
    AnalysisFailed { video_id: VideoId, message: String },

    #[error("The {stage} service did not respond within {timeout_secs} seconds.")]
    UpstreamTimeout {
        video_id: VideoId,
        stage: Stage,
        timeout_secs: u64,
    },
}

impl AnalysisFailure {
    pub fn video_id(&self) -> Option<&VideoId> {
        match self {
            AnalysisFailure::InvalidUrl => None,
            AnalysisFailure::NoTranscript { video_id }
            | AnalysisFailure::TranscriptFetch { video_id, .. }
            | AnalysisFailure::TranslationFailed { video_id, .. }
            | AnalysisFailure::AnalysisFailed { video_id, .. }
            | AnalysisFailure::UpstreamTimeout { video_id, .. } => Some(video_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisFailure::InvalidUrl => "INVALID_URL",
            AnalysisFailure::NoTranscript { .. } => "NO_TRANSCRIPT",
            AnalysisFailure::TranscriptFetch { .. } => "TRANSCRIPT_FETCH_ERROR",
            AnalysisFailure::TranslationFailed { .. } => "TRANSLATION_FAILED",
            AnalysisFailure::AnalysisFailed { .. } => "ANALYSIS_FAILED",
            AnalysisFailure::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
        }
    }
}

/// Pipeline milestones, reported to [`Analyzer::analyze_observed`] callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Started(Stage),
    TranscriptFetched { language_code: String, words: usize },
    Translated { language: String },
    Truncated { words: usize },
    Summarized,
}

#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    pub max_words: usize,
    pub target_language: String,
    pub upstream_timeout: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            target_language: TARGET_LANGUAGE.to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

/// URL → transcript → translation → truncation → summary, one request at a time.
pub struct Analyzer {
    transcripts: Arc<dyn TranscriptApi>,
    translator: Arc<dyn Translator>,
    summarizer: Arc<dyn Summarizer>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(
        transcripts: Arc<dyn TranscriptApi>,
        translator: Arc<dyn Translator>,
        summarizer: Arc<dyn Summarizer>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            transcripts,
            translator,
            summarizer,
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub async fn analyze(&self, raw_url: &str) -> Result<Analysis, AnalysisFailure> {
        self.analyze_observed(raw_url, &mut |_: Progress| {}).await
    }

    pub async fn analyze_observed(
        &self,
        raw_url: &str,
        observe: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<Analysis, AnalysisFailure> {
        let video_id = extract_video_id(raw_url).ok_or(AnalysisFailure::InvalidUrl)?;
        info!(%video_id, "analyzing video");

        observe(Progress::Started(Stage::Transcript));
        let outcome = self
            .with_deadline(
                Stage::Transcript,
                &video_id,
                fetch_transcript(
                    self.transcripts.as_ref(),
                    &video_id,
                    &self.config.target_language,
                ),
            )
            .await?;

        let (text, language_code) = match outcome {
            TranscriptOutcome::Fetched {
                text,
                language_code,
            } if !text.trim().is_empty() => (text, language_code),
            TranscriptOutcome::Fetched { .. } | TranscriptOutcome::Disabled => {
                return Err(AnalysisFailure::NoTranscript { video_id });
            }
            TranscriptOutcome::FetchError { message } => {
                return Err(AnalysisFailure::TranscriptFetch { video_id, message });
            }
        };
        observe(Progress::TranscriptFetched {
            language_code: language_code.clone(),
            words: text.split_whitespace().count(),
        });

        let needs_translation = language_code != self.config.target_language;
        if needs_translation {
            observe(Progress::Started(Stage::Translation));
        }
        let localized = self
            .with_deadline(
                Stage::Translation,
                &video_id,
                localize(
                    self.translator.as_ref(),
                    text,
                    language_code,
                    &self.config.target_language,
                ),
            )
            .await?
            .map_err(|e| {
                warn!(%video_id, error = %e, "translation failed");
                AnalysisFailure::TranslationFailed {
                    video_id: video_id.clone(),
                    message: e.to_string(),
                }
            })?;
        if needs_translation {
            observe(Progress::Translated {
                language: localized.language.clone(),
            });
        }

        let transcript = truncate_words(&localized.text, self.config.max_words);
        let words = transcript.split(' ').filter(|w| !w.is_empty()).count();
        observe(Progress::Truncated { words });
        info!(%video_id, language = %localized.language, words, "transcript ready");

        observe(Progress::Started(Stage::Summarization));
        let summary = self
            .with_deadline(
                Stage::Summarization,
                &video_id,
                self.summarizer.summarize(&transcript, &localized.language),
            )
            .await?
            .map_err(|e| {
                warn!(%video_id, error = %e, "summarization failed");
                AnalysisFailure::AnalysisFailed {
                    video_id: video_id.clone(),
                    message: e.to_string(),
                }
            })?;
        observe(Progress::Summarized);

        Ok(Analysis {
            video_id,
            transcript,
            summary,
            language: localized.language,
        })
    }

    async fn with_deadline<F: Future>(
        &self,
        stage: Stage,
        video_id: &VideoId,
        call: F,
    ) -> Result<F::Output, AnalysisFailure> {
        let timeout = self.config.upstream_timeout;
        tokio::time::timeout(timeout, call).await.map_err(|_| {
            warn!(%video_id, %stage, ?timeout, "upstream call timed out");
            AnalysisFailure::UpstreamTimeout {
                video_id: video_id.clone(),
                stage,
                timeout_secs: timeout.as_secs(),
            }
        })
    }
}
