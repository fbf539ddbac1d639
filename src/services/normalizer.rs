//! Reconciles provider output into the canonical itinerary shape.
//!
//! Provider JSON is decoded into loose raw types first (aliases, optional
//! everything, untyped scalars) and only then converted into [`Day`] and
//! [`Activity`] values. Anything that cannot be repaired becomes
//! [`ItineraryError::InvalidSchema`] carrying the JSON path of the problem.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::{ItineraryError, Result},
    services::enrichment::template_description,
    types::{Activity, Day, DraftItinerary, ItineraryRequest, TimeOfDay},
};

#[derive(Debug, Deserialize)]
struct RawDay {
    #[serde(default)]
    day: Option<Value>,
    #[serde(default, rename = "dayNumber", alias = "day_number")]
    day_number: Option<Value>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    activities: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawActivityEntry {
    Name(String),
    Detailed(RawActivity),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActivity {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    activity: Option<Value>,
    #[serde(default, alias = "time_of_day")]
    time_of_day: Option<Value>,
    #[serde(default)]
    time: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    location: Option<Value>,
    #[serde(default)]
    address: Option<Value>,
    #[serde(default, alias = "duration_minutes")]
    duration_minutes: Option<Value>,
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default, alias = "booking_link")]
    booking_link: Option<Value>,
    #[serde(default)]
    transportation: Option<Value>,
    #[serde(default)]
    categories: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
    #[serde(default, alias = "photo_url")]
    photo_url: Option<Value>,
    #[serde(default, alias = "local_tip")]
    local_tip: Option<Value>,
}

/// Normalize a parsed provider payload into validated days
pub fn normalize(payload: &Value, request: &ItineraryRequest) -> Result<DraftItinerary> {
    let object = payload
        .as_object()
        .ok_or_else(|| ItineraryError::InvalidSchema("payload is not a JSON object".to_string()))?;

    let (key, entries) = ["days", "itinerary"]
        .into_iter()
        .find_map(|key| {
            object
                .get(key)
                .and_then(Value::as_array)
                .map(|entries| (key, entries))
        })
        .ok_or_else(|| {
            ItineraryError::InvalidSchema("missing 'days' or 'itinerary' array".to_string())
        })?;

    if entries.is_empty() {
        return Err(ItineraryError::InvalidSchema(format!(
            "'{}' array is empty",
            key
        )));
    }

    let mut days = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let raw: RawDay = serde_path_to_error::deserialize(entry).map_err(|err| {
            let path = err.path().to_string();
            let location = if path == "." {
                format!("{}[{}]", key, position)
            } else {
                format!("{}[{}].{}", key, position, path)
            };
            ItineraryError::InvalidSchema(format!("{}: {}", location, err.inner()))
        })?;
        days.push(normalize_day(raw, position, key, entries.len(), request)?);
    }

    days.sort_by_key(|day| day.day_number);
    for (idx, day) in days.iter().enumerate() {
        if day.day_number != idx as u32 + 1 {
            return Err(ItineraryError::InvalidSchema(format!(
                "day numbers are not contiguous: expected day {}, found day {}",
                idx + 1,
                day.day_number
            )));
        }
    }

    let duration = request.duration() as usize;
    if days.len() < duration {
        return Err(ItineraryError::InvalidSchema(format!(
            "expected {} day(s), provider returned {}",
            duration,
            days.len()
        )));
    }
    if days.len() > duration {
        debug!(
            target: "tinytrip::normalize",
            returned = days.len(),
            duration,
            "dropping days beyond the requested duration"
        );
        days.truncate(duration);
    }

    Ok(DraftItinerary::new(request, days))
}

fn normalize_day(
    raw: RawDay,
    position: usize,
    key: &str,
    day_count: usize,
    request: &ItineraryRequest,
) -> Result<Day> {
    let day_number = raw
        .day
        .as_ref()
        .and_then(coerce_day_number)
        .or_else(|| raw.day_number.as_ref().and_then(coerce_day_number))
        .unwrap_or(position as u32 + 1);

    // Contiguous numbering means every day number lies within 1..=day_count
    if day_number as usize > day_count {
        return Err(ItineraryError::InvalidSchema(format!(
            "{}[{}] claims day {} but only {} day(s) were returned",
            key, position, day_number, day_count
        )));
    }
    let derived = request.date_for_day(day_number).ok_or_else(|| {
        ItineraryError::InvalidSchema(format!(
            "{}[{}] day {} falls outside the supported calendar",
            key, position, day_number
        ))
    })?;
    if let Some(explicit) = raw.date.as_ref().and_then(coerce_text) {
        match parse_date(&explicit) {
            Some(date) if date == derived => {}
            _ => warn!(
                target: "tinytrip::normalize",
                day = day_number,
                provided = %explicit,
                derived = %derived,
                "overriding provider date that does not match the trip calendar"
            ),
        }
    }

    let mut activities = Vec::new();
    for (entry_idx, entry) in raw.activities.unwrap_or_default().iter().enumerate() {
        let decoded: std::result::Result<RawActivityEntry, _> =
            serde_path_to_error::deserialize(entry);
        let raw_activity = match decoded {
            Ok(RawActivityEntry::Name(name)) => RawActivity {
                name: Some(Value::String(name)),
                ..RawActivity::default()
            },
            Ok(RawActivityEntry::Detailed(activity)) => activity,
            Err(err) => {
                debug!(
                    target: "tinytrip::normalize",
                    path = %format!("{}[{}].activities[{}]", key, position, entry_idx),
                    error = %err,
                    "skipping undecodable activity"
                );
                continue;
            }
        };

        let order_index = activities.len() as u32;
        if let Some(activity) = normalize_activity(raw_activity, order_index, request) {
            activities.push(activity);
        }
    }

    if activities.is_empty() {
        return Err(ItineraryError::InvalidSchema(format!(
            "{}[{}] (day {}) has no activities",
            key, position, day_number
        )));
    }

    Ok(Day {
        day_number,
        date: derived,
        activities,
    })
}

fn normalize_activity(
    raw: RawActivity,
    order_index: u32,
    request: &ItineraryRequest,
) -> Option<Activity> {
    let name = [&raw.name, &raw.title, &raw.activity]
        .into_iter()
        .find_map(|value| value.as_ref().and_then(coerce_text))?;

    let time_of_day = [&raw.time_of_day, &raw.time]
        .into_iter()
        .find_map(|value| value.as_ref().and_then(coerce_text))
        .and_then(|text| text.parse::<TimeOfDay>().ok())
        .unwrap_or_else(|| TimeOfDay::from_position(order_index as usize));

    let description = raw
        .description
        .as_ref()
        .and_then(coerce_text)
        .unwrap_or_else(|| template_description(&name, request.destination(), time_of_day));

    let duration_minutes = [&raw.duration_minutes, &raw.duration]
        .into_iter()
        .find_map(|value| value.as_ref().and_then(coerce_minutes));

    let categories = [&raw.categories, &raw.category]
        .into_iter()
        .find_map(|value| value.as_ref().and_then(coerce_categories));

    let mut activity = Activity::new(name, time_of_day, description, order_index);
    activity.location = raw.location.as_ref().and_then(coerce_text);
    activity.address = raw.address.as_ref().and_then(coerce_text);
    activity.duration_minutes = duration_minutes;
    activity.booking_link = raw.booking_link.as_ref().and_then(coerce_text);
    activity.transportation = raw.transportation.as_ref().and_then(coerce_text);
    activity.categories = categories;
    activity.photo_url = raw.photo_url.as_ref().and_then(coerce_text);
    activity.local_tip = raw.local_tip.as_ref().and_then(coerce_text);
    Some(activity)
}

fn coerce_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn coerce_day_number(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0 && *f > 0.0).map(|f| f as u64)),
        Value::String(text) => {
            let lower = text.trim().to_lowercase();
            lower.trim_start_matches("day").trim().parse::<u64>().ok()
        }
        _ => None,
    }?;
    u32::try_from(number).ok().filter(|n| *n >= 1)
}

/// Accepts 90, 90.0, "90", "90 minutes", "2 hours", "1.5h"
fn coerce_minutes(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let lower = text.trim().to_lowercase();
            let numeric: String = lower
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            let amount: f64 = numeric.parse().ok()?;
            let unit = lower[numeric.len()..].trim_start();
            if unit.starts_with('h') {
                amount * 60.0
            } else {
                amount
            }
        }
        _ => return None,
    };

    if minutes.is_finite() && minutes >= 1.0 && minutes <= f64::from(u32::MAX) {
        Some(minutes.round() as u32)
    } else {
        None
    }
}

fn coerce_categories(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(coerce_text)
                .collect::<Vec<_>>()
                .join(", ");
            (!joined.is_empty()).then_some(joined)
        }
        other => coerce_text(other),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(duration: u32) -> ItineraryRequest {
        ItineraryRequest::new(
            "Paris",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            duration,
            Vec::<String>::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_legacy_itinerary_key_with_defaults() {
        let payload = json!({
            "itinerary": [ { "activities": [ { "name": "X", "timeOfDay": "Morning" } ] } ]
        });

        let draft = normalize(&payload, &request(1)).unwrap();
        let day = &draft.days()[0];
        assert_eq!(day.day_number, 1);
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(day.activities.len(), 1);
        assert_eq!(day.activities[0].order_index, 0);
        assert_eq!(day.activities[0].time_of_day, TimeOfDay::Morning);
    }

    #[test]
    fn test_day_without_activities_is_rejected() {
        let payload = json!({ "days": [ { "activities": [] } ] });
        let err = normalize(&payload, &request(1)).unwrap_err();
        assert!(matches!(err, ItineraryError::InvalidSchema(_)));
    }

    #[test]
    fn test_missing_or_empty_days_rejected() {
        assert!(matches!(
            normalize(&json!({ "trip": [] }), &request(1)).unwrap_err(),
            ItineraryError::InvalidSchema(_)
        ));
        assert!(matches!(
            normalize(&json!({ "days": [] }), &request(1)).unwrap_err(),
            ItineraryError::InvalidSchema(_)
        ));
    }

    #[test]
    fn test_days_preferred_over_itinerary() {
        let payload = json!({
            "days": [ { "activities": ["Louvre"] } ],
            "itinerary": [ { "activities": ["Ignored"] } ]
        });
        let draft = normalize(&payload, &request(1)).unwrap();
        assert_eq!(draft.days()[0].activities[0].name, "Louvre");
    }

    #[test]
    fn test_order_index_overrides_provided_values() {
        let payload = json!({ "days": [ { "day": 1, "activities": [
            { "name": "A", "timeOfDay": "Morning", "orderIndex": 7 },
            { "name": "B", "timeOfDay": "Afternoon", "orderIndex": 7 },
            { "name": "C", "timeOfDay": "Evening" }
        ] } ] });

        let draft = normalize(&payload, &request(1)).unwrap();
        let indexes: Vec<u32> = draft.days()[0]
            .activities
            .iter()
            .map(|activity| activity.order_index)
            .collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn test_day_number_aliases_and_sorting() {
        let payload = json!({ "days": [
            { "dayNumber": 2, "activities": ["Second"] },
            { "day": "Day 1", "activities": ["First"] }
        ] });

        let draft = normalize(&payload, &request(2)).unwrap();
        assert_eq!(draft.days()[0].activities[0].name, "First");
        assert_eq!(draft.days()[1].day_number, 2);
        assert_eq!(draft.days()[1].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }

    #[test]
    fn test_huge_day_number_is_schema_error() {
        let payload = json!({ "days": [ { "day": 4_000_000_000u64, "activities": ["A"] } ] });
        let err = normalize(&payload, &request(1)).unwrap_err();
        assert!(matches!(err, ItineraryError::InvalidSchema(_)));
        assert!(err.to_string().contains("day 4000000000"));
    }

    #[test]
    fn test_day_number_beyond_returned_days_rejected() {
        let payload = json!({ "days": [
            { "day": 1, "activities": ["A"] },
            { "day": 9, "activities": ["B"] }
        ] });
        let err = normalize(&payload, &request(2)).unwrap_err();
        assert!(matches!(err, ItineraryError::InvalidSchema(_)));
    }

    #[test]
    fn test_day_near_calendar_end_is_schema_error() {
        let request =
            ItineraryRequest::new("Paris", NaiveDate::MAX, 1, Vec::<String>::new()).unwrap();
        let payload = json!({ "days": [
            { "day": 2, "activities": ["A"] },
            { "day": 1, "activities": ["B"] }
        ] });
        let err = normalize(&payload, &request).unwrap_err();
        assert!(err.to_string().contains("outside the supported calendar"));
    }

    #[test]
    fn test_extra_days_are_truncated() {
        let payload = json!({ "days": [
            { "day": 1, "activities": ["A"] },
            { "day": 2, "activities": ["B"] },
            { "day": 3, "activities": ["C"] }
        ] });
        let draft = normalize(&payload, &request(2)).unwrap();
        assert_eq!(draft.days().len(), 2);
    }

    #[test]
    fn test_duplicate_day_numbers_rejected() {
        let payload = json!({ "days": [
            { "day": 1, "activities": ["A"] },
            { "day": 1, "activities": ["B"] }
        ] });
        assert!(normalize(&payload, &request(2)).is_err());
    }

    #[test]
    fn test_mismatched_date_is_replaced() {
        let payload = json!({ "days": [ { "day": 1, "date": "1999-01-01", "activities": ["A"] } ] });
        let draft = normalize(&payload, &request(1)).unwrap();
        assert_eq!(draft.days()[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_too_few_days_rejected_and_extra_days_dropped() {
        let one_day = json!({ "days": [ { "activities": ["A"] } ] });
        assert!(normalize(&one_day, &request(2)).is_err());

        let three_days = json!({ "days": [
            { "activities": ["A"] }, { "activities": ["B"] }, { "activities": ["C"] }
        ] });
        let draft = normalize(&three_days, &request(2)).unwrap();
        assert_eq!(draft.days().len(), 2);
    }

    #[test]
    fn test_lenient_activity_fields() {
        let payload = json!({ "days": [ { "activities": [
            { "title": "Harbour Cruise", "time": "late afternoon", "duration": "2 hours",
              "category": ["Boat", "Sightseeing"], "location": "Pier 3" },
            { "name": "Dinner", "timeOfDay": "whenever", "durationMinutes": -5 },
            { "description": "no name here" },
            42
        ] } ] });

        let draft = normalize(&payload, &request(1)).unwrap();
        let activities = &draft.days()[0].activities;
        assert_eq!(activities.len(), 2);

        assert_eq!(activities[0].name, "Harbour Cruise");
        assert_eq!(activities[0].time_of_day, TimeOfDay::Afternoon);
        assert_eq!(activities[0].duration_minutes, Some(120));
        assert_eq!(activities[0].categories.as_deref(), Some("Boat, Sightseeing"));
        assert_eq!(activities[0].location.as_deref(), Some("Pier 3"));
        assert!(!activities[0].description.is_empty());

        assert_eq!(activities[1].time_of_day, TimeOfDay::Afternoon);
        assert_eq!(activities[1].duration_minutes, None);
        assert_eq!(activities[1].order_index, 1);
    }

    #[test]
    fn test_schema_error_reports_path() {
        let payload = json!({ "days": [ { "activities": "museum" } ] });
        let err = normalize(&payload, &request(1)).unwrap_err();
        assert!(err.to_string().contains("days[0]"));
        assert!(err.to_string().contains("activities"));
    }
}
