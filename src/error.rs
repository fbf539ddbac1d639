use thiserror::Error;

/// Main error type for itinerary generation
#[derive(Error, Debug)]
pub enum ItineraryError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider {provider} unavailable: no credential configured")]
    ProviderUnavailable { provider: String },

    #[error("Provider {provider} returned HTTP {status}: {message}")]
    ProviderHttp {
        provider: String,
        status: u16,
        rate_limited: bool,
        retry_after: Option<u64>,
        message: String,
    },

    #[error("Provider {provider} returned no usable text")]
    ProviderEmptyResponse { provider: String },

    #[error("Provider {provider} transport failure: {message}")]
    ProviderTransport { provider: String, message: String },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("No JSON object found in model output")]
    NoJsonObjectFound,

    #[error("Unparsable JSON: {0}")]
    UnparsableJson(String),

    #[error("Invalid itinerary schema: {0}")]
    InvalidSchema(String),

    #[error("Lookup error: {0}")]
    Lookup(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ItineraryError>;

impl ItineraryError {
    /// Whether the orchestrator should move on to the next provider
    pub fn is_fallback_trigger(&self) -> bool {
        !self.is_caller_error() && !matches!(self, ItineraryError::Config(_))
    }

    /// Whether the error was caused by bad caller input (4xx-equivalent)
    pub fn is_caller_error(&self) -> bool {
        matches!(self, ItineraryError::InvalidRequest(_))
    }

    /// Whether the provider signalled a rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            ItineraryError::ProviderHttp {
                rate_limited: true,
                ..
            }
        )
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ItineraryError::InvalidRequest(_) => "INVALID_REQUEST",
            ItineraryError::Config(_) => "CONFIG_ERROR",
            ItineraryError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            ItineraryError::ProviderHttp { .. } => "PROVIDER_HTTP_ERROR",
            ItineraryError::ProviderEmptyResponse { .. } => "PROVIDER_EMPTY_RESPONSE",
            ItineraryError::ProviderTransport { .. } => "PROVIDER_TRANSPORT_ERROR",
            ItineraryError::Timeout(_) => "TIMEOUT_ERROR",
            ItineraryError::NoJsonObjectFound => "NO_JSON_OBJECT_FOUND",
            ItineraryError::UnparsableJson(_) => "UNPARSABLE_JSON",
            ItineraryError::InvalidSchema(_) => "INVALID_SCHEMA",
            ItineraryError::Lookup(_) => "LOOKUP_ERROR",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "fallback": self.is_fallback_trigger()
            }
        })
    }
}
