pub mod anthropic;
pub mod json;
pub mod openai;

use crate::config::Settings;
use crate::error::SignalError;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl FromStr for Provider {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(SignalError::Configuration(format!(
                "LLM_PROVIDER must be `openai` or `anthropic` (got {other:?})"
            ))),
        }
    }
}

/// Text-generation service: prompt in, raw text out.
///
/// Implementations send [`crate::prompt::SYSTEM_INSTRUCTION`] alongside the
/// prompt and never inspect the returned text; validation happens in
/// [`json::parse_response`].
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete(&self, prompt: &str) -> Result<String, SignalError>;
}

/// Builds the client named by `LLM_PROVIDER` (OpenAI when unset). A missing
/// credential is a configuration error.
pub fn client_from_settings(settings: &Settings) -> Result<Arc<dyn LlmClient>, SignalError> {
    let provider = match settings.llm_provider.as_deref() {
        Some(s) => s.parse()?,
        None => Provider::OpenAI,
    };

    Ok(match provider {
        Provider::OpenAI => Arc::new(openai::OpenAiClient::from_settings(settings)?),
        Provider::Anthropic => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_configuration_error() {
        let err = client_from_settings(&Settings::default()).err().unwrap();
        assert!(matches!(err, SignalError::Configuration(ref m) if m.contains("OPENAI_API_KEY")));

        let settings = Settings {
            llm_provider: Some("anthropic".into()),
            ..Default::default()
        };
        let err = client_from_settings(&settings).err().unwrap();
        assert!(matches!(err, SignalError::Configuration(ref m) if m.contains("ANTHROPIC_API_KEY")));
    }

    #[test]
    fn selects_provider_from_settings() {
        let settings = Settings {
            llm_provider: Some("Anthropic".into()),
            anthropic_api_key: Some("test-key".into()),
            ..Default::default()
        };
        let client = client_from_settings(&settings).unwrap();
        assert_eq!(client.provider(), Provider::Anthropic);

        assert!("gemini".parse::<Provider>().is_err());
    }
}
