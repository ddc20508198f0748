use crate::config::Settings;
use crate::error::SignalError;
use crate::llm::{LlmClient, Provider};
use crate::prompt::SYSTEM_INSTRUCTION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-5";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, SignalError> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url = settings
            .openai_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .openai_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
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
        })
    }

    fn request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                Message {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }

    fn upstream(stage: &'static str, detail: impl Into<String>) -> SignalError {
        SignalError::UpstreamUnavailable {
            provider: Provider::OpenAI,
            stage,
            detail: detail.into(),
        }
    }

    fn response_text(res: ChatCompletionResponse) -> Result<String, SignalError> {
        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Self::upstream("decode", "response has no message content"))
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, prompt: &str) -> Result<String, SignalError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| Self::upstream("http", format!("OpenAI request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| Self::upstream("http", format!("failed to read OpenAI response body: {e}")))?;
        if !status.is_success() {
            return Err(Self::upstream("http", format!("status={status} body={text}")));
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&text).map_err(|e| {
            Self::upstream("decode", format!("unexpected OpenAI response ({e}): {text}"))
        })?;
        let content = Self::response_text(parsed)?;
        tracing::debug!(model = %self.model, bytes = content.len(), "OpenAI completion received");
        Ok(content)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> OpenAiClient {
        OpenAiClient::from_settings(&Settings {
            openai_api_key: Some("sk-test".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn request_carries_system_instruction_and_json_mode() {
        let body = serde_json::to_value(client().request("PROMPT")).unwrap();
        assert_eq!(body["model"], "gpt-5");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_INSTRUCTION);
        assert_eq!(body["messages"][1]["content"], "PROMPT");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn extracts_first_choice_content() {
        let res: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"a\":1}"}}]
        }))
        .unwrap();
        assert_eq!(OpenAiClient::response_text(res).unwrap(), "{\"a\":1}");

        let res: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        let err = OpenAiClient::response_text(res).unwrap_err();
        assert_eq!(err.kind(), "upstream_unavailable");
    }
}
