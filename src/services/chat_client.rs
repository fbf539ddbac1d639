use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ItineraryError, Result};

const USER_AGENT: &str = concat!("tiny-trip-rs/", env!("CARGO_PKG_VERSION"));

/// Minimal OpenAI-compatible chat completion transport.
///
/// Performs exactly one request per call; retry and fallback decisions belong
/// to the orchestrator.
#[derive(Clone)]
pub struct ChatCompletionClient {
    provider: String,
    api_key: String,
    base_url: String,
    extra_headers: Vec<(String, String)>,
    http: reqwest::Client,
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionClient {
    pub fn new(
        provider: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ItineraryError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            provider: provider.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            extra_headers: Vec::new(),
            http,
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let request_url = build_chat_url(&self.base_url);

        let mut request = self
            .http
            .post(&request_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        for (name, value) in &self.extra_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|err| self.transport(format!("HTTP request failed: {err}")))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let response_text = response
            .text()
            .await
            .map_err(|err| self.transport(format!("Failed to read response: {err}")))?;

        debug!(
            target: "tinytrip::provider",
            provider = %self.provider,
            status = status.as_u16(),
            bytes = response_text.len(),
            "chat completion response"
        );

        if !status.is_success() {
            let api_message = serde_json::from_str::<Value>(&response_text)
                .ok()
                .and_then(|body| {
                    body.get("error")
                        .and_then(|error| error.get("message"))
                        .and_then(|value| value.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| truncate(&response_text, 200));

            return Err(ItineraryError::ProviderHttp {
                provider: self.provider.clone(),
                status: status.as_u16(),
                rate_limited: status == StatusCode::TOO_MANY_REQUESTS,
                retry_after,
                message: api_message,
            });
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|err| self.transport(format!("Failed to parse JSON: {err}")))?;

        // Some gateways answer 200 with an error envelope
        if let Some(error) = response_json.get("error").filter(|error| !error.is_null()) {
            let error_message = error
                .get("message")
                .and_then(|value| value.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| error.to_string());
            let status = error
                .get("code")
                .and_then(|code| code.as_u64())
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(status.as_u16());
            return Err(ItineraryError::ProviderHttp {
                provider: self.provider.clone(),
                status,
                rate_limited: status == StatusCode::TOO_MANY_REQUESTS.as_u16(),
                retry_after,
                message: error_message,
            });
        }

        Ok(response_json)
    }

    fn transport(&self, message: String) -> ItineraryError {
        ItineraryError::ProviderTransport {
            provider: self.provider.clone(),
            message,
        }
    }
}

/// Pull the assistant text out of a chat completion response.
///
/// Reasoning models sometimes leave `content` empty and put the answer in
/// `reasoning` / `reasoning_content`, so those are tried in order. A response
/// wrapped in a top-level array is unwrapped first.
pub fn extract_message_text(response: &Value) -> Option<String> {
    let response = match response.as_array() {
        Some(items) => items.first()?,
        None => response,
    };

    let choice = response.get("choices")?.as_array()?.first()?;
    let message = choice.get("message");

    let candidates = [
        message.and_then(|m| m.get("content")),
        message.and_then(|m| m.get("reasoning")),
        message.and_then(|m| m.get("reasoning_content")),
        choice.get("text"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|value| value.as_str())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    response_format: Option<Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
            top_p: None,
            response_format: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_response_format(mut self, response_format: Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(top_p) = self.top_p {
            body["top_p"] = json!(top_p);
        }

        if let Some(response_format) = self.response_format {
            body["response_format"] = response_format;
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://openrouter.ai/api/v1/"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost:1234/v1/chat/completions"),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn test_extract_message_text_prefers_content() {
        let response = json!({
            "choices": [{ "message": { "content": "{\"days\":[]}", "reasoning": "thinking" } }]
        });
        assert_eq!(extract_message_text(&response).as_deref(), Some("{\"days\":[]}"));
    }

    #[test]
    fn test_extract_message_text_falls_back_to_reasoning() {
        let response = json!([{
            "choices": [{ "message": { "content": "", "reasoning": "plan... {\"days\":[]}" } }]
        }]);
        assert_eq!(
            extract_message_text(&response).as_deref(),
            Some("plan... {\"days\":[]}")
        );
    }

    #[test]
    fn test_extract_message_text_missing() {
        let response = json!({ "choices": [{ "message": { "content": null } }] });
        assert!(extract_message_text(&response).is_none());
        assert!(extract_message_text(&json!({ "choices": [] })).is_none());
    }

    #[test]
    fn test_request_body_fields() {
        let body = ChatCompletionRequest::new("m", vec![json!({"role": "user", "content": "hi"})])
            .with_max_tokens(Some(2048))
            .with_temperature(0.7)
            .with_response_format(json!({ "type": "json_object" }))
            .into_value();

        assert_eq!(body["model"], "m");
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("top_p").is_none());
    }
}
