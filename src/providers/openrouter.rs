use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::{ProviderSettings, TextGenerationClient};
use crate::{
    error::{ItineraryError, Result},
    services::{
        chat_client::{extract_message_text, ChatCompletionClient, ChatCompletionRequest},
        prompt::PromptSpec,
    },
    types::SourceTag,
};

pub const PROVIDER_NAME: &str = "openrouter";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "tngtech/deepseek-r1t-chimera:free";

const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.9;

/// Primary provider: an OpenRouter-hosted completion model driven by an
/// instruction-wrapped prompt
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    transport: Option<ChatCompletionClient>,
    model: String,
}

impl OpenRouterClient {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let transport = match settings.usable_key() {
            Some(api_key) => Some(
                ChatCompletionClient::new(
                    PROVIDER_NAME,
                    api_key,
                    &settings.base_url,
                    settings.request_timeout,
                )?
                .with_header("HTTP-Referer", "https://github.com/tiny-trip-rs")
                .with_header("X-Title", "Tiny Trip Itinerary Planner"),
            ),
            None => None,
        };

        Ok(Self {
            transport,
            model: settings.model,
        })
    }

    /// Settings with the public OpenRouter endpoint and default model
    pub fn default_settings(api_key: Option<String>) -> ProviderSettings {
        ProviderSettings::new(api_key, DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    fn request_body(&self, prompt: &PromptSpec) -> serde_json::Value {
        ChatCompletionRequest::new(
            self.model.clone(),
            vec![json!({
                "role": "user",
                "content": prompt.render_instruction_prompt(),
            })],
        )
        .with_max_tokens(Some(MAX_TOKENS))
        .with_temperature(TEMPERATURE)
        .with_top_p(TOP_P)
        .into_value()
    }
}

#[async_trait]
impl TextGenerationClient for OpenRouterClient {
    fn source(&self) -> SourceTag {
        SourceTag::ProviderA
    }

    async fn generate(&self, prompt: &PromptSpec) -> Result<String> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| ItineraryError::ProviderUnavailable {
                provider: PROVIDER_NAME.to_string(),
            })?;

        info!(
            target: "tinytrip::provider",
            provider = PROVIDER_NAME,
            model = %self.model,
            destination = %prompt.destination,
            "requesting itinerary"
        );

        let response = transport.chat_completion(&self.request_body(prompt)).await?;
        let text = extract_message_text(&response).ok_or_else(|| {
            ItineraryError::ProviderEmptyResponse {
                provider: PROVIDER_NAME.to_string(),
            }
        })?;

        debug!(
            target: "tinytrip::provider",
            provider = PROVIDER_NAME,
            chars = text.len(),
            "received completion text"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItineraryRequest;
    use chrono::NaiveDate;

    fn prompt() -> PromptSpec {
        let request = ItineraryRequest::new(
            "Rome",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            2,
            ["history"],
        )
        .unwrap();
        PromptSpec::from_request(&request, &[])
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let client = OpenRouterClient::new(OpenRouterClient::default_settings(Some("  ".into())))
            .unwrap();
        assert!(!client.is_configured());

        let err = client.generate(&prompt()).await.unwrap_err();
        assert!(matches!(err, ItineraryError::ProviderUnavailable { .. }));
        assert!(err.is_fallback_trigger());
    }

    #[test]
    fn test_request_body_uses_sampling_parameters() {
        let client =
            OpenRouterClient::new(OpenRouterClient::default_settings(Some("key".into()))).unwrap();
        let body = client.request_body(&prompt());

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["top_p"], 0.9);
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .starts_with("<s>[INST]"));
    }
}
