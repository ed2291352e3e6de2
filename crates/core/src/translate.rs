use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::types::LocalizedTranscript;

pub const GOOGLE_TRANSLATE_BASE_URL: &str = "https://translate.googleapis.com";

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation service returned HTTP {status}")]
    Status { status: u16 },

    #[error("unexpected translation response: {0}")]
    UnexpectedResponse(String),
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, dest_language: &str) -> Result<String, TranslateError>;
}

/// Client for the public `translate_a/single` endpoint. The whole text goes out
/// in one request.
pub struct GoogleTranslateClient {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, GOOGLE_TRANSLATE_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate(&self, text: &str, dest_language: &str) -> Result<String, TranslateError> {
        let response = self
            .client
            .post(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", dest_language),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranslateError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.json::<serde_json::Value>().await?;
        parse_translation(&body)
    }
}

/// The reply is a nested array; `[0][i][0]` holds the translated sentences.
fn parse_translation(body: &serde_json::Value) -> Result<String, TranslateError> {
    let sentences = body[0]
        .as_array()
        .ok_or_else(|| TranslateError::UnexpectedResponse(truncate_for_error(body)))?;

    Ok(sentences
        .iter()
        .filter_map(|sentence| sentence[0].as_str())
        .collect())
}

fn truncate_for_error(body: &serde_json::Value) -> String {
    body.to_string().chars().take(200).collect()
}

/// Label shown for a transcript translated from `language_code`.
pub fn translated_label(language_code: &str) -> String {
    format!("{language_code} (translated)")
}

/// Translate the transcript into `target_language` unless it already is in it.
pub async fn localize(
    translator: &dyn Translator,
    text: String,
    language_code: String,
    target_language: &str,
) -> Result<LocalizedTranscript, TranslateError> {
    if language_code == target_language {
        return Ok(LocalizedTranscript {
            text,
            language: language_code,
        });
    }

    info!(from = %language_code, to = target_language, "translating transcript");
    let translated = translator.translate(&text, target_language).await?;
    Ok(LocalizedTranscript {
        text: translated,
        language: translated_label(&language_code),
    })
}
