use crate::{
    schemas::PromptSchema,
    types::{ItineraryRequest, ProviderItinerary},
};

/// System message for providers that accept one
pub const JSON_ONLY_SYSTEM_PROMPT: &str =
    "You are a helpful travel planner assistant that responds only with valid JSON.";

const MAX_GROUNDING_ATTRACTIONS: usize = 10;

/// Everything a provider needs to know to plan the trip
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub destination: String,
    pub start_date: String,
    pub duration: u32,
    pub preferences: Vec<String>,
    pub attractions: Vec<String>,
    pub example_json: String,
    pub schema_json: String,
}

impl PromptSpec {
    pub fn from_request(request: &ItineraryRequest, attractions: &[String]) -> Self {
        let example_json = serde_json::to_string_pretty(&ProviderItinerary::example(request))
            .unwrap_or_else(|_| "{\"days\": []}".to_string());

        Self {
            destination: request.destination().to_string(),
            start_date: request.start_date().format("%Y-%m-%d").to_string(),
            duration: request.duration(),
            preferences: request.preference_descriptions(),
            attractions: attractions
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .take(MAX_GROUNDING_ATTRACTIONS)
                .collect(),
            example_json,
            schema_json: ProviderItinerary::schema().to_prompt_string(),
        }
    }

    fn interests(&self) -> String {
        if self.preferences.is_empty() {
            "a variety of activities".to_string()
        } else {
            self.preferences.join(", ")
        }
    }

    fn grounding(&self) -> String {
        if self.attractions.is_empty() {
            String::new()
        } else {
            format!(
                "\nPopular attractions in {} you may draw from: {}.\n",
                self.destination,
                self.attractions.join(", ")
            )
        }
    }

    /// Instruction-wrapped prompt for completion-style chat models
    pub fn render_instruction_prompt(&self) -> String {
        format!(
            "<s>[INST] You are a local travel expert in {destination} who specializes in highly personalized itineraries.

Create a detailed {duration}-day trip for someone starting on {start} who specifically requested these interests: {interests}.
{grounding}
IMPORTANT: You must respond with a valid JSON object that follows this exact structure:
{example}

For each activity, include the following fields:
- name: The real venue name
- timeOfDay: Morning, Afternoon, or Evening
- description: A brief 2-3 sentence description of the activity
- location: The venue address
- categories: The type of venue (e.g., museum, park, restaurant)

The \"days\" array must contain exactly {duration} entries numbered 1 to {duration}.

IMPORTANT INSTRUCTIONS:
1. DIRECTLY MATCH activities to the user's stated interests
2. Include ONLY real, specific venues and attractions in {destination}
3. Activities should be diverse across the trip
4. BALANCE the day with a mix of preferences
5. RESPOND ONLY WITH THE JSON OBJECT, NO OTHER TEXT

[/INST]</s>",
            destination = self.destination,
            duration = self.duration,
            start = self.start_date,
            interests = self.interests(),
            grounding = self.grounding(),
            example = self.example_json,
        )
    }

    /// Plain user prompt for providers that take a separate system message
    pub fn render_user_prompt(&self) -> String {
        format!(
            "Create a detailed travel itinerary for a trip to {destination} starting on {start} for {duration} days.
The traveler is interested in: {interests}.
{grounding}
Include a day-by-day breakdown with, for each activity, the activity name, a suggested time of day (Morning, Afternoon, Evening) and a short description.
Ensure the itinerary includes a balance of exploration, relaxation, and cultural experiences.

Format your response as a JSON object with exactly {duration} entries in \"days\", conforming to this JSON Schema:
{schema}",
            destination = self.destination,
            start = self.start_date,
            duration = self.duration,
            interests = self.interests(),
            grounding = self.grounding(),
            schema = self.schema_json,
        )
    }
}
