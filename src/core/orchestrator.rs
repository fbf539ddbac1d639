use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::{
    core::steps::GenerationStep,
    error::{ItineraryError, Result},
    lookups::AttractionLookup,
    providers::TextGenerationClient,
    services::{
        enrichment::ActivityEnricher, extractor, mock::MockItineraryGenerator, normalizer,
        prompt::PromptSpec,
    },
    types::{DraftItinerary, GenerationResult, ItineraryForm, ItineraryRequest, SourceTag},
};

/// How many popular attractions are requested for prompt grounding
const GROUNDING_ATTRACTIONS: usize = 10;

struct ProviderSlot {
    client: Arc<dyn TextGenerationClient>,
    enrich: bool,
}

enum State {
    TryProvider(usize),
    UseMock,
    Done(DraftItinerary, SourceTag),
}

/// Drives a request through the provider chain and always produces an
/// itinerary.
///
/// Providers are tried once each, in the order they were added. Any failure
/// (transport, HTTP status, empty answer, unparsable JSON, bad schema,
/// timeout) moves on to the next provider; once all have failed the offline
/// mock generator answers. The orchestrator is the only place a
/// [`SourceTag`] is attached to an itinerary.
pub struct ItineraryOrchestrator {
    providers: Vec<ProviderSlot>,
    enricher: Option<ActivityEnricher>,
    attractions: Option<Arc<dyn AttractionLookup>>,
    mock: MockItineraryGenerator,
    attempt_timeout: Option<Duration>,
    seed: Option<u64>,
}

impl fmt::Debug for ItineraryOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<String> = self
            .providers
            .iter()
            .map(|slot| format!("{}{}", slot.client.source(), if slot.enrich { "+enrich" } else { "" }))
            .collect();
        f.debug_struct("ItineraryOrchestrator")
            .field("providers", &providers)
            .field("enricher", &self.enricher)
            .field("grounding", &self.attractions.is_some())
            .field("attempt_timeout", &self.attempt_timeout)
            .field("seed", &self.seed)
            .finish()
    }
}

impl Default for ItineraryOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ItineraryOrchestrator {
    /// An orchestrator with no providers answers every request from the mock
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            enricher: None,
            attractions: None,
            mock: MockItineraryGenerator::new(),
            attempt_timeout: None,
            seed: None,
        }
    }

    /// Append a provider whose itineraries are enriched when an enricher is set
    pub fn with_provider(mut self, client: Arc<dyn TextGenerationClient>) -> Self {
        self.providers.push(ProviderSlot {
            client,
            enrich: true,
        });
        self
    }

    /// Append a provider whose itineraries are returned as normalized
    pub fn with_unenriched_provider(mut self, client: Arc<dyn TextGenerationClient>) -> Self {
        self.providers.push(ProviderSlot {
            client,
            enrich: false,
        });
        self
    }

    pub fn with_enricher(mut self, enricher: ActivityEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Ground prompts with popular attractions at the destination
    pub fn with_attraction_lookup(mut self, lookup: Arc<dyn AttractionLookup>) -> Self {
        self.attractions = Some(lookup);
        self
    }

    /// Treat a provider that has not answered within `timeout` as failed
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Seed every random choice (enrichment, mock content) for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sources in the order they will be tried
    pub fn provider_order(&self) -> Vec<SourceTag> {
        self.providers.iter().map(|slot| slot.client.source()).collect()
    }

    fn request_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Validate a raw form and generate. Only invalid input is an error.
    pub async fn generate_from_form(&self, form: &ItineraryForm) -> Result<GenerationResult> {
        let request = ItineraryRequest::from_form(form)?;
        Ok(self.generate(&request).await)
    }

    /// Generate an itinerary. Never fails: the mock generator is the last resort.
    pub async fn generate(&self, request: &ItineraryRequest) -> GenerationResult {
        let started = Instant::now();
        let mut steps = Vec::new();
        let mut rng = self.request_rng();

        info!(
            target: "tinytrip::orchestrator",
            destination = %request.destination(),
            start_date = %request.start_date(),
            duration = request.duration(),
            providers = self.providers.len(),
            "generating itinerary"
        );

        let prompt = self.build_prompt(request).await;

        let mut state = State::TryProvider(0);
        let (draft, source) = loop {
            state = match state {
                State::TryProvider(idx) => match self.providers.get(idx) {
                    None => State::UseMock,
                    Some(slot) => {
                        let source = slot.client.source();
                        steps.push(GenerationStep::Attempt { source });

                        match self.attempt(slot, &prompt, request).await {
                            Ok(mut draft) => {
                                steps.push(GenerationStep::Normalized {
                                    source,
                                    days: draft.days().len(),
                                });

                                if let Some(enricher) = self.enricher.as_ref().filter(|_| slot.enrich) {
                                    enricher.enrich_itinerary(&mut draft, &mut rng).await;
                                    steps.push(GenerationStep::Enriched {
                                        activities: draft
                                            .days()
                                            .iter()
                                            .map(|day| day.activities.len())
                                            .sum(),
                                    });
                                }

                                State::Done(draft, source)
                            }
                            Err(err) => {
                                warn!(
                                    target: "tinytrip::orchestrator",
                                    source = %source,
                                    code = err.error_code(),
                                    rate_limited = err.is_rate_limited(),
                                    error = %err,
                                    "provider attempt failed, falling back"
                                );
                                steps.push(GenerationStep::failure(source, &err));
                                State::TryProvider(idx + 1)
                            }
                        }
                    }
                },
                State::UseMock => {
                    steps.push(GenerationStep::MockFallback);
                    let draft = self.mock.generate_with(request, &mut rng);
                    State::Done(draft, SourceTag::Mock)
                }
                State::Done(draft, source) => break (draft, source),
            };
        };

        let itinerary = draft.into_tagged(source);
        debug_assert!(itinerary.is_well_formed());

        let result = GenerationResult::new(itinerary, steps, started.elapsed());
        info!(
            target: "tinytrip::orchestrator",
            source = %result.source,
            failures = result.failure_count(),
            elapsed_ms = result.duration.as_millis() as u64,
            "itinerary ready"
        );
        result
    }

    /// Generate, answering from the mock generator if `deadline` expires first
    pub async fn generate_within(
        &self,
        request: &ItineraryRequest,
        deadline: Duration,
    ) -> GenerationResult {
        let started = Instant::now();
        match tokio::time::timeout(deadline, self.generate(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    target: "tinytrip::orchestrator",
                    deadline_secs = deadline.as_secs_f64(),
                    "deadline expired, answering with mock itinerary"
                );
                let steps = vec![
                    GenerationStep::DeadlineExpired {
                        seconds: deadline.as_secs(),
                    },
                    GenerationStep::MockFallback,
                ];
                let draft = self.mock.generate_with(request, &mut self.request_rng());
                GenerationResult::new(draft.into_tagged(SourceTag::Mock), steps, started.elapsed())
            }
        }
    }

    /// Skip every provider and answer from the mock generator
    pub fn mock_only(&self, request: &ItineraryRequest) -> GenerationResult {
        let started = Instant::now();
        let draft = self.mock.generate_with(request, &mut self.request_rng());
        GenerationResult::new(
            draft.into_tagged(SourceTag::Mock),
            vec![GenerationStep::MockFallback],
            started.elapsed(),
        )
    }

    async fn build_prompt(&self, request: &ItineraryRequest) -> PromptSpec {
        let attractions = match &self.attractions {
            Some(lookup) => match lookup
                .popular_attractions(request.destination(), GROUNDING_ATTRACTIONS)
                .await
            {
                Ok(found) => {
                    debug!(
                        target: "tinytrip::orchestrator",
                        count = found.len(),
                        "grounding attractions fetched"
                    );
                    found
                }
                Err(err) => {
                    debug!(
                        target: "tinytrip::orchestrator",
                        error = %err,
                        "grounding lookup failed, continuing without it"
                    );
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        PromptSpec::from_request(request, &attractions)
    }

    /// One provider attempt: generate, extract, normalize
    async fn attempt(
        &self,
        slot: &ProviderSlot,
        prompt: &PromptSpec,
        request: &ItineraryRequest,
    ) -> Result<DraftItinerary> {
        let call = slot.client.generate(prompt);
        let raw = match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                ItineraryError::Timeout(format!(
                    "{} did not answer within {:.1}s",
                    slot.client.source(),
                    limit.as_secs_f64()
                ))
            })??,
            None => call.await?,
        };

        let extracted = extractor::extract_json(&raw)?;
        debug!(
            target: "tinytrip::orchestrator",
            source = %slot.client.source(),
            json_chars = extracted.text.len(),
            "extracted JSON payload"
        );
        normalizer::normalize(&extracted.value, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct CannedClient {
        source: SourceTag,
        /// `None` answers with text that holds no JSON at all
        answer: Option<&'static str>,
    }

    #[async_trait]
    impl TextGenerationClient for CannedClient {
        fn source(&self) -> SourceTag {
            self.source
        }

        async fn generate(&self, _prompt: &PromptSpec) -> Result<String> {
            Ok(self.answer.unwrap_or("I could not plan this trip.").to_string())
        }
    }

    struct SlowClient;

    #[async_trait]
    impl TextGenerationClient for SlowClient {
        fn source(&self) -> SourceTag {
            SourceTag::ProviderA
        }

        async fn generate(&self, _prompt: &PromptSpec) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("{}".to_string())
        }
    }

    fn request(duration: u32) -> ItineraryRequest {
        ItineraryRequest::new(
            "Lisbon",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            duration,
            ["food_wine"],
        )
        .unwrap()
    }

    fn one_day_json() -> &'static str {
        r#"```json
{"days":[{"day":1,"activities":[{"name":"Time Out Market","timeOfDay":"Morning","description":"Food hall."}]}]}
```"#
    }

    #[tokio::test]
    async fn test_no_providers_uses_mock() {
        let result = ItineraryOrchestrator::new().with_seed(1).generate(&request(2)).await;
        assert!(result.is_mock());
        assert!(result.itinerary.is_well_formed());
        assert_eq!(result.steps, vec![GenerationStep::MockFallback]);
    }

    #[tokio::test]
    async fn test_first_success_wins_and_is_tagged() {
        let orchestrator = ItineraryOrchestrator::new()
            .with_provider(Arc::new(CannedClient {
                source: SourceTag::ProviderA,
                answer: Some(one_day_json()),
            }))
            .with_provider(Arc::new(CannedClient {
                source: SourceTag::ProviderB,
                answer: None,
            }));

        let result = orchestrator.generate(&request(1)).await;
        assert_eq!(result.source, SourceTag::ProviderA);
        assert_eq!(result.itinerary.source_tag, SourceTag::ProviderA);
        assert_eq!(result.itinerary.days[0].activities[0].name, "Time Out Market");
        assert_eq!(result.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_schema_failure_falls_through_to_next_provider() {
        let orchestrator = ItineraryOrchestrator::new()
            .with_provider(Arc::new(CannedClient {
                source: SourceTag::ProviderA,
                answer: Some(r#"{"days":[{"activities":[]}]}"#),
            }))
            .with_unenriched_provider(Arc::new(CannedClient {
                source: SourceTag::ProviderB,
                answer: Some(one_day_json()),
            }));

        let result = orchestrator.generate(&request(1)).await;
        assert_eq!(result.source, SourceTag::ProviderB);
        assert_eq!(result.failure_count(), 1);
        match &result.steps[1] {
            GenerationStep::Failure { code, .. } => assert_eq!(code, "INVALID_SCHEMA"),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_enrichment_only_for_enriched_slots() {
        let enriched = ItineraryOrchestrator::new()
            .with_provider(Arc::new(CannedClient {
                source: SourceTag::ProviderA,
                answer: Some(one_day_json()),
            }))
            .with_enricher(ActivityEnricher::new())
            .with_seed(5)
            .generate(&request(1))
            .await;
        let activity = &enriched.itinerary.days[0].activities[0];
        assert!(activity.transportation.is_some());
        assert_eq!(activity.address.as_deref(), Some("Lisbon"));

        let plain = ItineraryOrchestrator::new()
            .with_unenriched_provider(Arc::new(CannedClient {
                source: SourceTag::ProviderA,
                answer: Some(one_day_json()),
            }))
            .with_enricher(ActivityEnricher::new())
            .generate(&request(1))
            .await;
        assert!(plain.itinerary.days[0].activities[0].transportation.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_falls_back() {
        let orchestrator = ItineraryOrchestrator::new()
            .with_provider(Arc::new(SlowClient))
            .with_attempt_timeout(Duration::from_secs(2));

        let result = orchestrator.generate(&request(1)).await;
        assert!(result.is_mock());
        match &result.steps[1] {
            GenerationStep::Failure { code, .. } => assert_eq!(code, "TIMEOUT_ERROR"),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_within_deadline_returns_mock() {
        let orchestrator = ItineraryOrchestrator::new().with_provider(Arc::new(SlowClient));

        let result = orchestrator
            .generate_within(&request(3), Duration::from_secs(5))
            .await;
        assert!(result.is_mock());
        assert_eq!(result.itinerary.days.len(), 3);
        assert!(matches!(
            result.steps[0],
            GenerationStep::DeadlineExpired { seconds: 5 }
        ));
    }

    #[tokio::test]
    async fn test_invalid_form_is_the_only_error() {
        let form = ItineraryForm {
            destination: Some("Lisbon".to_string()),
            start_date: Some("2024-05-01".to_string()),
            duration: Some(30),
            preferences: vec![],
        };
        let err = ItineraryOrchestrator::new()
            .generate_from_form(&form)
            .await
            .unwrap_err();
        assert!(err.is_caller_error());
    }
}
