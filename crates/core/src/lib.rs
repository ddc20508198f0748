pub mod aggregate;
pub mod domain;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod time;

pub use error::{Result, SignalError};
pub use pipeline::SignalService;

pub mod config {
    use crate::error::SignalError;

    /// Process configuration, read once at startup and passed down by reference.
    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub llm_provider: Option<String>,
        pub openai_api_key: Option<String>,
        pub openai_base_url: Option<String>,
        pub openai_model: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub anthropic_base_url: Option<String>,
        pub anthropic_model: Option<String>,
        pub anthropic_max_tokens: Option<u32>,
        pub llm_timeout_secs: Option<u64>,
        pub market_data_base_url: Option<String>,
        pub market_data_timeout_secs: Option<u64>,
        pub earnings_source: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> Self {
            Self {
                llm_provider: var("LLM_PROVIDER"),
                openai_api_key: var("OPENAI_API_KEY"),
                openai_base_url: var("OPENAI_BASE_URL"),
                openai_model: var("OPENAI_MODEL"),
                anthropic_api_key: var("ANTHROPIC_API_KEY"),
                anthropic_base_url: var("ANTHROPIC_BASE_URL"),
                anthropic_model: var("ANTHROPIC_MODEL"),
                anthropic_max_tokens: var("ANTHROPIC_MAX_TOKENS").and_then(|s| s.parse().ok()),
                llm_timeout_secs: var("LLM_TIMEOUT_SECS").and_then(|s| s.parse().ok()),
                market_data_base_url: var("MARKET_DATA_BASE_URL"),
                market_data_timeout_secs: var("MARKET_DATA_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok()),
                earnings_source: var("EARNINGS_SOURCE"),
                sentry_dsn: var("SENTRY_DSN"),
            }
        }

        pub fn require_openai_api_key(&self) -> Result<&str, SignalError> {
            self.openai_api_key
                .as_deref()
                .ok_or_else(|| SignalError::Configuration("OPENAI_API_KEY is required".into()))
        }

        pub fn require_anthropic_api_key(&self) -> Result<&str, SignalError> {
            self.anthropic_api_key
                .as_deref()
                .ok_or_else(|| SignalError::Configuration("ANTHROPIC_API_KEY is required".into()))
        }
    }

    // Blank values count as unset.
    fn var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        // Only this test touches these keys.
        #[test]
        fn blank_env_values_are_unset() {
            std::env::set_var("SENTRY_DSN", "   ");
            std::env::set_var("ANTHROPIC_MODEL", "  claude-test  ");
            std::env::set_var("ANTHROPIC_MAX_TOKENS", "");
            std::env::set_var("MARKET_DATA_TIMEOUT_SECS", "soon");

            let settings = Settings::from_env();
            assert_eq!(settings.sentry_dsn, None);
            assert_eq!(settings.anthropic_model.as_deref(), Some("claude-test"));
            assert_eq!(settings.anthropic_max_tokens, None);
            assert_eq!(settings.market_data_timeout_secs, None);

            for key in [
                "SENTRY_DSN",
                "ANTHROPIC_MODEL",
                "ANTHROPIC_MAX_TOKENS",
                "MARKET_DATA_TIMEOUT_SECS",
            ] {
                std::env::remove_var(key);
            }
        }

        #[test]
        fn missing_keys_are_configuration_errors() {
            let err = Settings::default().require_openai_api_key().unwrap_err();
            assert_eq!(err.kind(), "configuration_error");
        }
    }
}
