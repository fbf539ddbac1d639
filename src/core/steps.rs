use serde::{Deserialize, Serialize};

use crate::{error::ItineraryError, types::itinerary::SourceTag};

/// A single transition recorded while generating an itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationStep {
    /// A provider was asked for an itinerary
    Attempt { source: SourceTag },
    /// The provider attempt failed at some stage and the engine moved on
    Failure {
        source: SourceTag,
        code: String,
        message: String,
    },
    /// Provider output normalized into a valid itinerary
    Normalized { source: SourceTag, days: usize },
    /// Activities were enriched with lookup details
    Enriched { activities: usize },
    /// Every provider failed; the synthetic generator took over
    MockFallback,
    /// The overall deadline expired before any provider finished
    DeadlineExpired { seconds: u64 },
}

impl GenerationStep {
    pub(crate) fn failure(source: SourceTag, error: &ItineraryError) -> Self {
        GenerationStep::Failure {
            source,
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }

    /// Get a human-readable description of the step
    pub fn describe(&self) -> String {
        match self {
            GenerationStep::Attempt { source } => format!("🧭 Attempt: {}", source),
            GenerationStep::Failure {
                source,
                code,
                message,
            } => format!("❌ {} failed [{}]: {}", source, code, message),
            GenerationStep::Normalized { source, days } => {
                format!("🧩 Normalized {} day(s) from {}", days, source)
            }
            GenerationStep::Enriched { activities } => {
                format!("🔧 Enriched {} activities", activities)
            }
            GenerationStep::MockFallback => "🎲 Falling back to mock generator".to_string(),
            GenerationStep::DeadlineExpired { seconds } => {
                format!("⏱ Deadline of {}s expired", seconds)
            }
        }
    }
}
