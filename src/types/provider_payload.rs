use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{itinerary::TimeOfDay, request::ItineraryRequest};
use crate::schemas::{PromptSchema, SchemaHandle};

/// Itinerary shape providers are instructed to emit.
///
/// This is the documented contract only; responses are never trusted to match
/// it and always go through the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProviderItinerary {
    /// One entry per day of the trip, in order
    pub days: Vec<ProviderDay>,
}

/// A single day in the provider response
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProviderDay {
    /// 1-based day counter within the trip
    pub day: u32,
    /// ISO-8601 calendar date of the day (YYYY-MM-DD)
    pub date: String,
    /// Activities for the day in chronological order
    pub activities: Vec<ProviderActivity>,
}

/// A single activity in the provider response
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderActivity {
    /// The real venue or experience name
    pub name: String,
    /// One of Morning, Afternoon or Evening
    pub time_of_day: String,
    /// A brief 2-3 sentence description of the activity
    pub description: String,
    /// The venue address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Type of venue (e.g. museum, park, restaurant)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
}

impl ProviderItinerary {
    /// A one-day sample showing providers the expected layout
    pub fn example(request: &ItineraryRequest) -> Self {
        Self {
            days: vec![ProviderDay {
                day: 1,
                date: request.start_date().format("%Y-%m-%d").to_string(),
                activities: vec![ProviderActivity {
                    name: "Activity Name".to_string(),
                    time_of_day: TimeOfDay::ALL
                        .iter()
                        .map(TimeOfDay::as_str)
                        .collect::<Vec<_>>()
                        .join("/"),
                    description: "2-3 sentence description".to_string(),
                    location: Some("Venue address".to_string()),
                    categories: Some(
                        "Type of venue (e.g., museum, park, restaurant)".to_string(),
                    ),
                }],
            }],
        }
    }
}

impl PromptSchema for ProviderItinerary {
    fn schema() -> &'static SchemaHandle {
        static HANDLE: std::sync::OnceLock<SchemaHandle> = std::sync::OnceLock::new();
        HANDLE.get_or_init(|| SchemaHandle::for_type::<Self>("itinerary"))
    }
}
