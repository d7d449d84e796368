use serde::{Deserialize, Serialize};

use crate::{
    error::{ClipperError, Result},
    types::ApiKey,
};

/// OpenAI-compatible chat-completion backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
            Provider::Gemini => "Gemini",
        }
    }

    /// Read the API key from this provider's environment variable.
    pub fn api_key_from_env(&self) -> Result<ApiKey> {
        let env_var = self.config().env_var;
        std::env::var(env_var)
            .ok()
            .map(ApiKey::new)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ClipperError::MissingApiKey {
                env_var: env_var.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_is_the_default_backend() {
        let provider = Provider::default();
        assert_eq!(provider, Provider::Openai);
        assert_eq!(provider.config().model, "gpt-4o");
        assert!(provider.config().api_url.ends_with("/chat/completions"));
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = ClipperError::MissingApiKey {
            env_var: Provider::Grok.config().env_var.to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing API key: XAI_API_KEY environment variable is not set"
        );
    }
}
