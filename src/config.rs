//! Engine configuration from environment variables.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `OPENROUTER_API_KEY`, `OPENROUTER_BASE_URL`, `OPENROUTER_MODEL` | primary provider |
//! | `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL` | secondary provider |
//! | `UNSPLASH_ACCESS_KEY` | enables activity photos |
//! | `FOURSQUARE_API_KEY` | enables prompt grounding with popular attractions |
//! | `ITINERARY_PROVIDER_ORDER` | comma list, e.g. `provider-b,provider-a` |
//! | `ITINERARY_ATTEMPT_TIMEOUT_SECS` | per-provider attempt timeout |
//! | `ITINERARY_REQUEST_TIMEOUT_SECS` | HTTP timeout for provider calls |
//! | `ITINERARY_ENRICH` | `true`/`false`, enrichment of primary output |
//! | `ITINERARY_SEED` | seed for reproducible random choices |

use std::{str::FromStr, sync::Arc, time::Duration};

use tracing::debug;

use crate::{
    core::ItineraryOrchestrator,
    error::{ItineraryError, Result},
    lookups::{
        FoursquareAttractionLookup, NominatimPlaceLookup, UnsplashPhotoLookup,
        WikipediaSummaryLookup,
    },
    providers::{
        OpenAiClient, OpenRouterClient, ProviderSettings, TextGenerationClient,
        DEFAULT_REQUEST_TIMEOUT,
    },
    services::enrichment::ActivityEnricher,
    types::SourceTag,
};

pub const DEFAULT_PROVIDER_ORDER: [SourceTag; 2] = [SourceTag::ProviderA, SourceTag::ProviderB];

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub primary: ProviderSettings,
    pub secondary: ProviderSettings,
    pub unsplash_access_key: Option<String>,
    pub foursquare_api_key: Option<String>,
    pub provider_order: Vec<SourceTag>,
    pub attempt_timeout: Option<Duration>,
    pub request_timeout: Duration,
    pub enrich: bool,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary: OpenRouterClient::default_settings(None),
            secondary: OpenAiClient::default_settings(None),
            unsplash_access_key: None,
            foursquare_api_key: None,
            provider_order: DEFAULT_PROVIDER_ORDER.to_vec(),
            attempt_timeout: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            enrich: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(target: "tinytrip::config", path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();

        let primary = ProviderSettings::new(
            get("OPENROUTER_API_KEY"),
            get("OPENROUTER_BASE_URL").unwrap_or(defaults.primary.base_url),
            get("OPENROUTER_MODEL").unwrap_or(defaults.primary.model),
        );
        let secondary = ProviderSettings::new(
            get("OPENAI_API_KEY"),
            get("OPENAI_BASE_URL").unwrap_or(defaults.secondary.base_url),
            get("OPENAI_MODEL").unwrap_or(defaults.secondary.model),
        );

        let provider_order = match get("ITINERARY_PROVIDER_ORDER") {
            Some(raw) => parse_provider_order(&raw)?,
            None => defaults.provider_order,
        };

        let attempt_timeout = get("ITINERARY_ATTEMPT_TIMEOUT_SECS")
            .map(|raw| parse_seconds("ITINERARY_ATTEMPT_TIMEOUT_SECS", &raw))
            .transpose()?;
        let request_timeout = get("ITINERARY_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_seconds("ITINERARY_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?
            .unwrap_or(defaults.request_timeout);

        let enrich = get("ITINERARY_ENRICH")
            .map(|raw| parse_bool("ITINERARY_ENRICH", &raw))
            .transpose()?
            .unwrap_or(defaults.enrich);

        let seed = get("ITINERARY_SEED")
            .map(|raw| parse_value::<u64>("ITINERARY_SEED", &raw))
            .transpose()?;

        Ok(Self {
            primary,
            secondary,
            unsplash_access_key: get("UNSPLASH_ACCESS_KEY"),
            foursquare_api_key: get("FOURSQUARE_API_KEY"),
            provider_order,
            attempt_timeout,
            request_timeout,
            enrich,
            seed,
        })
    }

    pub fn with_provider_order(mut self, order: Vec<SourceTag>) -> Self {
        self.provider_order = order;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_enrichment(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn provider(&self, tag: SourceTag) -> Result<Option<Arc<dyn TextGenerationClient>>> {
        let client: Arc<dyn TextGenerationClient> = match tag {
            SourceTag::ProviderA => Arc::new(OpenRouterClient::new(
                self.primary
                    .clone()
                    .with_request_timeout(self.request_timeout),
            )?),
            SourceTag::ProviderB => Arc::new(OpenAiClient::new(
                self.secondary
                    .clone()
                    .with_request_timeout(self.request_timeout),
            )?),
            SourceTag::Mock => return Ok(None),
        };
        Ok(Some(client))
    }

    fn enricher(&self) -> Result<ActivityEnricher> {
        let mut enricher = ActivityEnricher::new()
            .with_place_lookup(Arc::new(NominatimPlaceLookup::new()?))
            .with_summary_lookup(Arc::new(WikipediaSummaryLookup::new()?));
        if let Some(key) = &self.unsplash_access_key {
            enricher = enricher.with_photo_lookup(Arc::new(UnsplashPhotoLookup::new(key.clone())?));
        }
        Ok(enricher)
    }

    /// Wire adapters, lookups and policies into an orchestrator.
    ///
    /// Unconfigured providers are still wired: they fail fast with
    /// `ProviderUnavailable`, which shows up in the generation trace.
    pub fn build_orchestrator(&self) -> Result<ItineraryOrchestrator> {
        let mut orchestrator = ItineraryOrchestrator::new();

        for tag in &self.provider_order {
            let Some(client) = self.provider(*tag)? else {
                continue;
            };
            // Only the primary provider's output is enriched
            orchestrator = match tag {
                SourceTag::ProviderA => orchestrator.with_provider(client),
                _ => orchestrator.with_unenriched_provider(client),
            };
        }

        if self.enrich {
            orchestrator = orchestrator.with_enricher(self.enricher()?);
        }
        if let Some(key) = &self.foursquare_api_key {
            orchestrator = orchestrator
                .with_attraction_lookup(Arc::new(FoursquareAttractionLookup::new(key.clone())?));
        }
        if let Some(timeout) = self.attempt_timeout {
            orchestrator = orchestrator.with_attempt_timeout(timeout);
        }
        if let Some(seed) = self.seed {
            orchestrator = orchestrator.with_seed(seed);
        }

        Ok(orchestrator)
    }
}

/// Parse `provider-a,provider-b` into tags, dropping duplicates
pub fn parse_provider_order(raw: &str) -> Result<Vec<SourceTag>> {
    let mut order = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let tag = SourceTag::from_str(part)?;
        if tag == SourceTag::Mock {
            return Err(ItineraryError::Config(
                "ITINERARY_PROVIDER_ORDER lists providers only; the mock always runs last"
                    .to_string(),
            ));
        }
        if !order.contains(&tag) {
            order.push(tag);
        }
    }

    if order.is_empty() {
        return Err(ItineraryError::Config(
            "ITINERARY_PROVIDER_ORDER is empty".to_string(),
        ));
    }
    Ok(order)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|err| ItineraryError::Config(format!("{key}=`{raw}` is invalid: {err}")))
}

/// Parse a positive, representable number of seconds such as `2.5`
pub fn parse_seconds(key: &str, raw: &str) -> Result<Duration> {
    let seconds = parse_value::<f64>(key, raw)?;
    Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|duration| !duration.is_zero())
        .ok_or_else(|| {
            ItineraryError::Config(format!(
                "{key} must be a positive number of seconds, got `{raw}`"
            ))
        })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ItineraryError::Config(format!(
            "{key} must be a boolean, got `{raw}`"
        ))),
    }
}
