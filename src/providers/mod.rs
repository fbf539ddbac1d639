//! Text-generation provider adapters.
//!
//! An adapter turns a [`PromptSpec`] into raw model text with exactly one
//! remote call. It never retries and never parses the answer; the
//! orchestrator owns extraction, normalization and fallback.

use std::time::Duration;

use async_trait::async_trait;

use crate::{error::Result, services::prompt::PromptSpec, types::SourceTag};

pub mod openai;
pub mod openrouter;

pub use openai::OpenAiClient;
pub use openrouter::OpenRouterClient;

/// Default request timeout for provider calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A remote text-completion capability
#[async_trait]
pub trait TextGenerationClient: Send + Sync {
    /// Provenance tag attached to itineraries this client produced
    fn source(&self) -> SourceTag;

    /// Ask the model for an itinerary and return its raw text
    async fn generate(&self, prompt: &PromptSpec) -> Result<String>;
}

/// Connection settings shared by the chat-completion adapters
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// `None` or blank means the provider is unavailable
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl ProviderSettings {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            model: model.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub(crate) fn usable_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
