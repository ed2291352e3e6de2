use secrecy::SecretString;

use crate::error::RecapError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.0-pro-exp-02-05",
                env_var: "GEMINI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    /// Resolve the API key: an explicit value wins, otherwise the provider's env var.
    pub fn resolve_api_key(&self, explicit: Option<String>) -> Result<SecretString, RecapError> {
        let config = self.config();
        explicit
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(config.env_var).ok())
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| RecapError::MissingApiKey {
                env_var: config.env_var.to_string(),
            })
    }
}
