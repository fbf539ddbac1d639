use crate::{
    core::steps::GenerationStep,
    types::itinerary::{Itinerary, SourceTag},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of an itinerary generation run.
///
/// Serializes to `{ "itinerary": ..., "source": ... }`; the trace and timing
/// stay in process for logging and replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub itinerary: Itinerary,
    pub source: SourceTag,
    /// Every transition taken by the orchestrator
    #[serde(skip)]
    pub steps: Vec<GenerationStep>,
    /// Total generation duration
    #[serde(skip)]
    pub duration: Duration,
}

impl GenerationResult {
    pub fn new(itinerary: Itinerary, steps: Vec<GenerationStep>, duration: Duration) -> Self {
        Self {
            source: itinerary.source_tag,
            itinerary,
            steps,
            duration,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.source == SourceTag::Mock
    }

    /// Number of provider attempts that failed before the final source
    pub fn failure_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, GenerationStep::Failure { .. }))
            .count()
    }

    /// Generate a human-readable replay of the generation
    pub fn replay(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Itinerary Generation Trace ===".to_string());
        lines.push(format!("Duration: {:.2}s", self.duration.as_secs_f64()));
        lines.push(format!("Source: {}", self.source));
        lines.push(format!(
            "Trip: {} day(s) in {} from {}",
            self.itinerary.duration, self.itinerary.destination, self.itinerary.start_date
        ));

        lines.push(String::new());
        lines.push("--- Steps ---".to_string());

        for (idx, step) in self.steps.iter().enumerate() {
            lines.push(format!("{}. {}", idx + 1, step.describe()));
        }

        lines.push(String::new());
        lines.push("--- Days ---".to_string());
        for day in &self.itinerary.days {
            lines.push(format!("Day {} ({})", day.day_number, day.date));
            for activity in &day.activities {
                lines.push(format!("   {:<9} {}", activity.time_of_day, activity.name));
            }
        }

        lines.join("\n")
    }
}
