use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{ProviderSettings, TextGenerationClient};
use crate::{
    error::{ItineraryError, Result},
    services::{
        chat_client::{extract_message_text, ChatCompletionClient, ChatCompletionRequest},
        prompt::{PromptSpec, JSON_ONLY_SYSTEM_PROMPT},
    },
    types::SourceTag,
};

pub const PROVIDER_NAME: &str = "openai";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const TEMPERATURE: f64 = 0.7;

/// Secondary provider: an OpenAI chat model in JSON-object response mode
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    transport: Option<ChatCompletionClient>,
    model: String,
}

impl OpenAiClient {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let transport = settings
            .usable_key()
            .map(|api_key| {
                ChatCompletionClient::new(
                    PROVIDER_NAME,
                    api_key,
                    &settings.base_url,
                    settings.request_timeout,
                )
            })
            .transpose()?;

        Ok(Self {
            transport,
            model: settings.model,
        })
    }

    pub fn default_settings(api_key: Option<String>) -> ProviderSettings {
        ProviderSettings::new(api_key, DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    fn request_body(&self, prompt: &PromptSpec) -> serde_json::Value {
        ChatCompletionRequest::new(
            self.model.clone(),
            vec![
                json!({ "role": "system", "content": JSON_ONLY_SYSTEM_PROMPT }),
                json!({ "role": "user", "content": prompt.render_user_prompt() }),
            ],
        )
        .with_temperature(TEMPERATURE)
        .with_response_format(json!({ "type": "json_object" }))
        .into_value()
    }
}

#[async_trait]
impl TextGenerationClient for OpenAiClient {
    fn source(&self) -> SourceTag {
        SourceTag::ProviderB
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
        extract_message_text(&response).ok_or_else(|| ItineraryError::ProviderEmptyResponse {
            provider: PROVIDER_NAME.to_string(),
        })
    }
}
