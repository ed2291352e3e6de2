use std::time::Duration;

use clap::{Parser, ValueEnum};
use recap_core::{AnalyzerConfig, DEFAULT_MAX_WORDS, Provider, TARGET_LANGUAGE};

/// clap-facing mirror of [`Provider`].
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliProvider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "recap-web")]
#[command(about = "Serve a web page that summarizes YouTube videos from their transcripts")]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "RECAP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "RECAP_PORT", default_value_t = 5000)]
    pub port: u16,

    /// AI provider used for summaries
    #[arg(short, long, env = "RECAP_PROVIDER", value_enum, default_value = "gemini")]
    pub provider: CliProvider,

    /// Model name, defaults to the provider's
    #[arg(short, long, env = "RECAP_MODEL")]
    pub model: Option<String>,

    /// API key, defaults to the provider's environment variable
    #[arg(long, env = "RECAP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Words of transcript sent to the model
    #[arg(long, env = "RECAP_MAX_WORDS", default_value_t = DEFAULT_MAX_WORDS)]
    pub max_words: usize,

    /// Deadline for each call to YouTube, the translator and the model
    #[arg(long, env = "RECAP_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            max_words: self.max_words,
            target_language: TARGET_LANGUAGE.to_string(),
            upstream_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
