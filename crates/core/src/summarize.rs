use std::fmt;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::{
    error::{RecapError, Result},
    provider::Provider,
};

/// Returned verbatim when the model answers without any text.
pub const FALLBACK_SUMMARY: &str = "Error generating response.";

/// Build the structured-summary prompt for a (possibly truncated) transcript.
pub fn build_prompt(text: &str, language: &str) -> String {
    format!(
        r#"Analyze the following YouTube video transcript and generate a comprehensive and structured summary.

Include the following sections:
1. Introduction: Briefly describe the topic and purpose of the video.
2. Key Points: List the main points and arguments made by the speaker(s) in bullet points.
3. Important Insights: Highlight any significant findings, examples, statistics, or noteworthy insights.
4. Conclusion: Summarize the overall message, call-to-action, or final takeaway of the video.

Additional guidelines:
- Ensure the summary is detailed, informative, and at least 500 words.
- Make it easy to read with bullet points and headers.
- If the transcript is in another language, translate and summarize it in English.

Transcript Language: {language}

Transcript:
{text}
"#
    )
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, language: &str) -> Result<String>;
}

/// Everything needed to talk to the generative model. Built once at startup.
#[derive(Clone)]
pub struct SummarizerConfig {
    pub provider: Provider,
    pub api_url: String,
    pub model: String,
    pub api_key: SecretString,
}

impl SummarizerConfig {
    /// Provider defaults, with an optional model override.
    pub fn new(provider: Provider, model: Option<String>, api_key: SecretString) -> Self {
        let defaults = provider.config();
        Self {
            provider,
            api_url: defaults.api_url.to_string(),
            model: model.unwrap_or_else(|| defaults.model.to_string()),
            api_key,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

impl fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Summarizer speaking the OpenAI-compatible chat-completions protocol.
pub struct ChatSummarizer {
    client: reqwest::Client,
    config: SummarizerConfig,
}

impl ChatSummarizer {
    pub fn new(client: reqwest::Client, config: SummarizerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, text: &str, language: &str) -> Result<String> {
        let prompt = build_prompt(text, language);
        debug!(
            provider = self.config.provider.name(),
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "requesting summary"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Content-Type", "application/json")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .json(&serde_json::json!({
                "model": self.config.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": 0.3,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RecapError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let response: serde_json::Value = serde_json::from_str(&body)?;
        match response["choices"][0]["message"]["content"].as_str() {
            Some(content) => Ok(content.to_string()),
            None => {
                warn!(model = %self.config.model, "model returned no text");
                Ok(FALLBACK_SUMMARY.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    use super::*;

    /// Records what it was asked to summarize.
    #[derive(Default)]
    pub(crate) struct FakeSummarizer {
        pub seen: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Summarizer for FakeSummarizer {
        async fn summarize(&self, text: &str, language: &str) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((text.to_string(), language.to_string()));
            if self.fail {
                return Err(RecapError::ApiStatus {
                    status: 429,
                    body: "Resource has been exhausted (e.g. check quota).".into(),
                });
            }
            Ok("## Introduction\nA fake summary.".into())
        }
    }

    fn config(server: &MockServer) -> SummarizerConfig {
        SummarizerConfig::new(Provider::Gemini, None, SecretString::from("test-key"))
            .with_api_url(format!("{}/v1/chat/completions", server.uri()))
    }

    #[test]
    fn prompt_names_sections_and_language() {
        let prompt = build_prompt("some words", "de (translated)");
        for section in [
            "1. Introduction:",
            "2. Key Points:",
            "3. Important Insights:",
            "4. Conclusion:",
        ] {
            assert!(prompt.contains(section), "missing {section}");
        }
        assert!(prompt.contains("at least 500 words"));
        assert!(prompt.contains("Transcript Language: de (translated)"));
        assert!(prompt.trim_end().ends_with("Transcript:\nsome words"));
    }

    #[test]
    fn config_uses_provider_defaults_and_overrides() {
        let key = SecretString::from("k");
        let config = SummarizerConfig::new(Provider::Gemini, None, key.clone());
        assert_eq!(config.model, "gemini-2.0-pro-exp-02-05");
        assert!(config.api_url.contains("generativelanguage.googleapis.com"));

        let config = SummarizerConfig::new(Provider::Openai, Some("gpt-custom".into()), key);
        assert_eq!(config.model, "gpt-custom");
    }

    #[test]
    fn config_debug_hides_the_key() {
        let config = SummarizerConfig::new(Provider::Grok, None, SecretString::from("xai-secret"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("xai-secret"), "key leaked: {debug}");
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn returns_model_text_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(
                serde_json::json!({"model": "gemini-2.0-pro-exp-02-05"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "## Introduction\nHi."}}]
            })))
            .mount(&server)
            .await;

        let summarizer = ChatSummarizer::new(reqwest::Client::new(), config(&server));
        let summary = summarizer.summarize("words", "en").await.unwrap();
        assert_eq!(summary, "## Introduction\nHi.");
    }

    #[tokio::test]
    async fn missing_text_yields_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let summarizer = ChatSummarizer::new(reqwest::Client::new(), config(&server));
        assert_eq!(
            summarizer.summarize("words", "en").await.unwrap(),
            FALLBACK_SUMMARY
        );
    }

    #[tokio::test]
    async fn quota_errors_propagate_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let summarizer = ChatSummarizer::new(reqwest::Client::new(), config(&server));
        let err = summarizer.summarize("words", "en").await.unwrap_err();
        assert!(matches!(err, RecapError::ApiStatus { status: 429, .. }));
        assert!(err.to_string().contains("quota exceeded"));
    }
}
