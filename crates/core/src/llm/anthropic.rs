use crate::config::Settings;
use crate::error::SignalError;
use crate::llm::{LlmClient, Provider};
use crate::prompt::SYSTEM_INSTRUCTION;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, SignalError> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url = settings
            .anthropic_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .anthropic_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let max_tokens = settings.anthropic_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        let timeout_secs = settings.llm_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SignalError::Configuration(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    fn upstream(stage: &'static str, detail: impl Into<String>) -> SignalError {
        SignalError::UpstreamUnavailable {
            provider: Provider::Anthropic,
            stage,
            detail: detail.into(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, SignalError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| SignalError::Configuration("ANTHROPIC_API_KEY is not a valid header value".into()))?;
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        Ok(headers)
    }

    async fn create_message(
        &self,
        req: CreateMessageRequest,
    ) -> Result<CreateMessageResponse, SignalError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&req)
            .send()
            .await
            .map_err(|e| Self::upstream("http", format!("Anthropic request failed: {e}")))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            Self::upstream("http", format!("failed to read Anthropic response body: {e}"))
        })?;
        if !status.is_success() {
            return Err(Self::upstream("http", format!("status={status} body={text}")));
        }

        serde_json::from_str::<CreateMessageResponse>(&text).map_err(|e| {
            Self::upstream("decode", format!("unexpected Anthropic response ({e}): {text}"))
        })
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::Thinking
                | ContentBlock::RedactedThinking
                | ContentBlock::Unknown => {}
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, prompt: &str) -> Result<String, SignalError> {
        let req = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(SYSTEM_INSTRUCTION.to_string()),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let res = self.create_message(req).await?;

        // A truncated answer is returned as-is and rejected by validation.
        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(
                model = %self.model,
                max_tokens = self.max_tokens,
                "Anthropic stop_reason=max_tokens; output is likely truncated"
            );
        }

        let text = Self::response_text(&res);
        if text.is_empty() {
            return Err(Self::upstream("decode", "response has no text content"));
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "thinking")]
    Thinking,

    #[serde(rename = "redacted_thinking")]
    RedactedThinking,

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_text_blocks_and_skips_thinking() {
        let res: CreateMessageResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "sig"},
                {"type": "text", "text": "{\"reasoning\":"},
                {"type": "tool_use", "id": "toolu_1", "name": "x", "input": {}},
                {"type": "text", "text": "\"x\"}"},
            ],
            "stop_reason": "end_turn",
        }))
        .unwrap();

        assert_eq!(
            AnthropicClient::response_text(&res),
            "{\"reasoning\":\n\"x\"}"
        );
    }

    #[test]
    fn request_uses_system_instruction() {
        let req = CreateMessageRequest {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: Some(SYSTEM_INSTRUCTION.to_string()),
            messages: vec![Message {
                role: "user",
                content: "PROMPT".to_string(),
            }],
        };
        let body = serde_json::to_value(req).unwrap();
        assert_eq!(body["system"], SYSTEM_INSTRUCTION);
        assert_eq!(body["messages"][0]["role"], "user");
    }
}
