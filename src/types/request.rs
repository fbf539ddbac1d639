use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ItineraryError, Result};

/// Longest trip the engine will plan, in days
pub const MAX_DURATION_DAYS: u32 = 14;

/// A validated itinerary request.
///
/// Construction goes through [`ItineraryRequest::new`] or
/// [`ItineraryRequest::from_form`], so every value reaching the engine already
/// has a non-empty destination, a duration within `1..=MAX_DURATION_DAYS`
/// and a last trip day that is a representable date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRequest {
    destination: String,
    start_date: NaiveDate,
    duration: u32,
    preferences: BTreeSet<String>,
}

impl ItineraryRequest {
    pub fn new<I, S>(
        destination: impl Into<String>,
        start_date: NaiveDate,
        duration: u32,
        preferences: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let destination = destination.into().trim().to_string();
        if destination.is_empty() {
            return Err(ItineraryError::InvalidRequest(
                "destination must not be empty".to_string(),
            ));
        }

        if !(1..=MAX_DURATION_DAYS).contains(&duration) {
            return Err(ItineraryError::InvalidRequest(format!(
                "duration must be between 1 and {} days, got {}",
                MAX_DURATION_DAYS, duration
            )));
        }

        if start_date
            .checked_add_days(Days::new(u64::from(duration - 1)))
            .is_none()
        {
            return Err(ItineraryError::InvalidRequest(format!(
                "a {}-day trip starting {} runs past the supported calendar",
                duration, start_date
            )));
        }

        let preferences = preferences
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        Ok(Self {
            destination,
            start_date,
            duration,
            preferences,
        })
    }

    /// Validate a raw form as submitted by the surrounding HTTP layer
    pub fn from_form(form: &ItineraryForm) -> Result<Self> {
        let destination = form
            .destination
            .as_deref()
            .ok_or_else(|| ItineraryError::InvalidRequest("missing destination".to_string()))?;

        let raw_date = form
            .start_date
            .as_deref()
            .ok_or_else(|| ItineraryError::InvalidRequest("missing startDate".to_string()))?;
        let start_date = parse_date(raw_date).ok_or_else(|| {
            ItineraryError::InvalidRequest(format!(
                "startDate `{}` is not a YYYY-MM-DD date",
                raw_date
            ))
        })?;

        let duration = form
            .duration
            .ok_or_else(|| ItineraryError::InvalidRequest("missing duration".to_string()))?;
        let duration = u32::try_from(duration).map_err(|_| {
            ItineraryError::InvalidRequest(format!("duration {} is out of range", duration))
        })?;

        Self::new(destination, start_date, duration, &form.preferences)
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn preferences(&self) -> &BTreeSet<String> {
        &self.preferences
    }

    /// Date of the given 1-based day of the trip, `None` when it falls off the calendar
    pub fn date_for_day(&self, day_number: u32) -> Option<NaiveDate> {
        self.start_date
            .checked_add_days(Days::new(u64::from(day_number.saturating_sub(1))))
    }

    /// Day numbers and dates of every day in the trip, in order
    pub fn trip_days(&self) -> impl Iterator<Item = (u32, NaiveDate)> + '_ {
        (1..=self.duration)
            .filter_map(move |day_number| Some((day_number, self.date_for_day(day_number)?)))
    }

    /// Human-readable descriptions of the selected preferences, for prompts
    pub fn preference_descriptions(&self) -> Vec<String> {
        self.preferences
            .iter()
            .map(|tag| match Preference::lookup(tag) {
                Some(pref) => format!("{} ({})", pref.name, pref.description),
                None => tag.replace('_', " "),
            })
            .collect()
    }
}

/// Unvalidated request body, mirroring the JSON the front end submits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryForm {
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub duration: Option<i64>,
    #[serde(default)]
    pub preferences: Vec<String>,
}

/// Interest tag offered to travellers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preference {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

impl Preference {
    pub const CATALOG: [Preference; 15] = [
        Preference::new("beach", "Beach", "Beach vacations and coastal activities"),
        Preference::new("hiking", "Hiking", "Hiking trails and outdoor adventures"),
        Preference::new("nightlife", "Nightlife", "Bars, clubs and evening entertainment"),
        Preference::new("museums", "Museums", "Museums and art galleries"),
        Preference::new("food_wine", "Food & Wine", "Culinary experiences and wine tasting"),
        Preference::new("shopping", "Shopping", "Shopping districts and markets"),
        Preference::new("wildlife", "Wildlife", "Animal watching and wildlife reserves"),
        Preference::new("photography", "Photography", "Scenic spots perfect for photos"),
        Preference::new("adventure", "Adventure", "Thrilling and adventurous activities"),
        Preference::new("history", "History", "Historical sites and landmarks"),
        Preference::new("culture", "Culture", "Local traditions and cultural experiences"),
        Preference::new("relaxation", "Relaxation", "Spas and wellness retreats"),
        Preference::new("family", "Family", "Family-friendly activities"),
        Preference::new("romantic", "Romantic", "Perfect for couples"),
        Preference::new("budget", "Budget", "Affordable travel options"),
    ];

    const fn new(id: &'static str, name: &'static str, description: &'static str) -> Self {
        Self {
            id,
            name,
            description,
        }
    }

    pub fn lookup(id: &str) -> Option<&'static Preference> {
        Self::CATALOG.iter().find(|pref| pref.id == id)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    // Accept full timestamps by keeping only the calendar date
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
