use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::request::ItineraryRequest;
use crate::error::ItineraryError;

/// Part of the day an activity is scheduled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 3] = [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening];

    /// Slot implied by an activity's position within its day
    pub fn from_position(index: usize) -> Self {
        match index {
            0 => TimeOfDay::Morning,
            1 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = ItineraryError;

    /// Lenient parse: models write "morning", "Late Morning", "night", "sunset"...
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let lower = raw.trim().to_lowercase();
        if lower.contains("morning") || lower.contains("breakfast") || lower.contains("sunrise") {
            Ok(TimeOfDay::Morning)
        } else if lower.contains("afternoon") || lower.contains("noon") || lower.contains("lunch")
        {
            Ok(TimeOfDay::Afternoon)
        } else if lower.contains("evening")
            || lower.contains("night")
            || lower.contains("dinner")
            || lower.contains("sunset")
        {
            Ok(TimeOfDay::Evening)
        } else {
            Err(ItineraryError::InvalidSchema(format!(
                "unrecognised time of day `{}`",
                raw
            )))
        }
    }
}

/// Provenance marker for a generated itinerary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    #[serde(rename = "provider-A")]
    ProviderA,
    #[serde(rename = "provider-B")]
    ProviderB,
    #[serde(rename = "mock")]
    Mock,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::ProviderA => "provider-A",
            SourceTag::ProviderB => "provider-B",
            SourceTag::Mock => "mock",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = ItineraryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "provider-a" | "primary" | "openrouter" => Ok(SourceTag::ProviderA),
            "provider-b" | "secondary" | "openai" => Ok(SourceTag::ProviderB),
            "mock" => Ok(SourceTag::Mock),
            other => Err(ItineraryError::Config(format!("unknown provider `{}`", other))),
        }
    }
}

/// A single planned activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    pub time_of_day: TimeOfDay,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transportation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_tip: Option<String>,
    pub order_index: u32,
}

impl Activity {
    /// Skeleton activity carrying only the fields every source provides
    pub fn new(
        name: impl Into<String>,
        time_of_day: TimeOfDay,
        description: impl Into<String>,
        order_index: u32,
    ) -> Self {
        Self {
            name: name.into(),
            time_of_day,
            description: description.into(),
            location: None,
            address: None,
            duration_minutes: None,
            booking_link: None,
            transportation: None,
            categories: None,
            photo_url: None,
            local_tip: None,
            order_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub day_number: u32,
    pub date: NaiveDate,
    pub activities: Vec<Activity>,
}

/// A complete, tagged itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub destination: String,
    pub start_date: NaiveDate,
    pub duration: u32,
    pub days: Vec<Day>,
    /// Original preference tag identifiers from the request
    pub preferences: BTreeSet<String>,
    pub source_tag: SourceTag,
}

impl Itinerary {
    /// Check the structural guarantees every returned itinerary must hold
    pub fn is_well_formed(&self) -> bool {
        self.days.len() == self.duration as usize
            && self.days.iter().enumerate().all(|(idx, day)| {
                let day_number = idx as u32 + 1;
                day.day_number == day_number
                    && self
                        .start_date
                        .checked_add_days(chrono::Days::new(idx as u64))
                        == Some(day.date)
                    && !day.activities.is_empty()
                    && day
                        .activities
                        .iter()
                        .enumerate()
                        .all(|(position, activity)| activity.order_index == position as u32)
            })
    }
}

/// Validated days that have not yet been attributed to a source.
///
/// Only the orchestrator turns a draft into an [`Itinerary`], which keeps the
/// decision about provenance in one place.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftItinerary {
    destination: String,
    start_date: NaiveDate,
    duration: u32,
    preferences: BTreeSet<String>,
    days: Vec<Day>,
}

impl DraftItinerary {
    pub fn new(request: &ItineraryRequest, days: Vec<Day>) -> Self {
        Self {
            destination: request.destination().to_string(),
            start_date: request.start_date(),
            duration: request.duration(),
            preferences: request.preferences().clone(),
            days,
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn preferences(&self) -> &BTreeSet<String> {
        &self.preferences
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn days_mut(&mut self) -> &mut [Day] {
        &mut self.days
    }

    pub(crate) fn into_tagged(self, source_tag: SourceTag) -> Itinerary {
        Itinerary {
            destination: self.destination,
            start_date: self.start_date,
            duration: self.duration,
            days: self.days,
            preferences: self.preferences,
            source_tag,
        }
    }
}
