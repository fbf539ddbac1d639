//! Best-effort activity enrichment.
//!
//! Each activity is augmented with a description, address, duration,
//! transportation, category, photo and local tip. The place, summary and photo
//! lookups for one activity run concurrently, and every activity of an
//! itinerary is enriched concurrently. Lookup failures are logged and leave
//! the corresponding field to its fallback; enrichment itself never fails.

use std::{collections::BTreeSet, fmt, sync::Arc};

use futures::future::{join3, join_all};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::debug;

use crate::{
    lookups::{PhotoLookup, PlaceInfo, PlaceLookup, SummaryLookup},
    types::{Activity, DraftItinerary, TimeOfDay},
};

pub const TRANSPORT_OPTIONS: [&str; 6] = ["Walk", "Taxi", "Subway", "Bus", "Tram", "Bike Share"];

/// Inclusive range for generated visit durations, in minutes
pub const DURATION_RANGE_MINUTES: (u32, u32) = (90, 150);

/// Augments bare activities using optional lookup collaborators
#[derive(Clone, Default)]
pub struct ActivityEnricher {
    places: Option<Arc<dyn PlaceLookup>>,
    summaries: Option<Arc<dyn SummaryLookup>>,
    photos: Option<Arc<dyn PhotoLookup>>,
}

impl fmt::Debug for ActivityEnricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityEnricher")
            .field("places", &self.places.is_some())
            .field("summaries", &self.summaries.is_some())
            .field("photos", &self.photos.is_some())
            .finish()
    }
}

impl ActivityEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place_lookup(mut self, lookup: Arc<dyn PlaceLookup>) -> Self {
        self.places = Some(lookup);
        self
    }

    pub fn with_summary_lookup(mut self, lookup: Arc<dyn SummaryLookup>) -> Self {
        self.summaries = Some(lookup);
        self
    }

    pub fn with_photo_lookup(mut self, lookup: Arc<dyn PhotoLookup>) -> Self {
        self.photos = Some(lookup);
        self
    }

    /// Enrich every activity of a draft in place.
    ///
    /// One seed per activity is drawn from `rng` up front, so the outcome is
    /// reproducible under a seeded generator regardless of lookup timing.
    pub async fn enrich_itinerary(&self, draft: &mut DraftItinerary, rng: &mut StdRng) {
        let destination = draft.destination().to_string();
        let preferences = draft.preferences().clone();

        let mut jobs = Vec::new();
        for (day_idx, day) in draft.days_mut().iter_mut().enumerate() {
            for activity in std::mem::take(&mut day.activities) {
                jobs.push((day_idx, activity, rng.gen::<u64>()));
            }
        }

        let total = jobs.len();
        let destination = destination.as_str();
        let preferences = &preferences;
        let enriched = join_all(jobs.into_iter().map(|(day_idx, activity, seed)| async move {
            let mut activity_rng = StdRng::seed_from_u64(seed);
            let activity = self
                .enrich(activity, destination, preferences, &mut activity_rng)
                .await;
            (day_idx, activity)
        }))
        .await;

        let days = draft.days_mut();
        for (day_idx, activity) in enriched {
            days[day_idx].activities.push(activity);
        }

        debug!(target: "tinytrip::enrich", activities = total, "itinerary enriched");
    }

    /// Enrich one activity. Never fails.
    pub async fn enrich(
        &self,
        mut activity: Activity,
        destination: &str,
        preferences: &BTreeSet<String>,
        rng: &mut StdRng,
    ) -> Activity {
        let query = format!("{} {}", activity.name, destination);
        let (place, summary, photo) = join3(
            self.lookup_place(&query),
            self.lookup_summary(&activity.name),
            self.lookup_photo(&query),
        )
        .await;

        activity.description = summary
            .or_else(|| non_empty(&activity.description))
            .unwrap_or_else(|| {
                template_description(&activity.name, destination, activity.time_of_day)
            });

        activity.address = place
            .map(|place| place.address)
            .filter(|address| !address.is_empty())
            .or(activity.address.take())
            .or_else(|| Some(destination.to_string()));

        if activity.location.is_none() {
            activity.location = Some(activity.name.clone());
        }

        if activity.duration_minutes.is_none() {
            let (min, max) = DURATION_RANGE_MINUTES;
            activity.duration_minutes = Some(rng.gen_range(min..=max));
        }

        if activity.transportation.is_none() {
            activity.transportation = TRANSPORT_OPTIONS
                .choose(rng)
                .map(|option| option.to_string());
        }

        if activity.categories.is_none() {
            activity.categories = Some(infer_category(&activity.name, preferences).to_string());
        }

        if activity.photo_url.is_none() {
            activity.photo_url = photo;
        }

        if activity.local_tip.is_none() {
            activity.local_tip = Some(local_tip(preferences, activity.time_of_day, rng).to_string());
        }

        activity
    }

    async fn lookup_place(&self, query: &str) -> Option<PlaceInfo> {
        let lookup = self.places.as_ref()?;
        match lookup.find_place(query).await {
            Ok(place) => place,
            Err(err) => {
                debug!(target: "tinytrip::enrich", query, error = %err, "place lookup failed");
                None
            }
        }
    }

    async fn lookup_summary(&self, title: &str) -> Option<String> {
        let lookup = self.summaries.as_ref()?;
        match lookup.summary(title).await {
            Ok(summary) => summary.and_then(|text| non_empty(&text)),
            Err(err) => {
                debug!(target: "tinytrip::enrich", title, error = %err, "summary lookup failed");
                None
            }
        }
    }

    async fn lookup_photo(&self, query: &str) -> Option<String> {
        let lookup = self.photos.as_ref()?;
        match lookup.photo_url(query).await {
            Ok(url) => url.and_then(|url| non_empty(&url)),
            Err(err) => {
                debug!(target: "tinytrip::enrich", query, error = %err, "photo lookup failed");
                None
            }
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Keyword-driven description used when nothing better is known
pub fn template_description(name: &str, destination: &str, time_of_day: TimeOfDay) -> String {
    let lower = name.to_lowercase();
    let period = time_of_day.as_str().to_lowercase();

    if contains_any(&lower, &["restaurant", "café", "cafe"]) {
        format!(
            "{name} is a popular dining spot in {destination}, known for its local cuisine. \
             It's especially vibrant during the {period}."
        )
    } else if contains_any(&lower, &["museum", "gallery"]) {
        format!(
            "{name} is a fascinating cultural venue showcasing {destination}'s heritage \
             through impressive exhibits and collections."
        )
    } else if contains_any(&lower, &["park", "garden"]) {
        format!(
            "{name} offers a peaceful retreat from the bustle of {destination}, \
             with beautiful scenery and walking paths to enjoy."
        )
    } else {
        format!(
            "{name} is a must-visit attraction in {destination}, \
             particularly enjoyable during the {period}."
        )
    }
}

/// Category from the venue name, then from the traveller's interests
pub fn infer_category(name: &str, preferences: &BTreeSet<String>) -> &'static str {
    let lower = name.to_lowercase();

    const BY_NAME: [(&[&str], &str); 8] = [
        (&["museum", "gallery"], "Museum/Gallery"),
        (&["park", "garden"], "Park/Garden"),
        (&["restaurant", "café", "cafe"], "Restaurant/Café"),
        (&["beach", "shore"], "Beach/Waterfront"),
        (&["market", "shop"], "Shopping"),
        (&["trail", "hike"], "Hiking/Outdoors"),
        (&["temple", "church", "mosque"], "Religious Site"),
        (&["monument", "memorial"], "Monument"),
    ];
    if let Some((_, category)) = BY_NAME
        .iter()
        .find(|(keywords, _)| contains_any(&lower, keywords))
    {
        return *category;
    }

    const BY_PREFERENCE: [(&str, &[&str], &str); 4] = [
        ("museum", &["history"], "Museum/Gallery"),
        ("hiking", &["mountain", "peak"], "Hiking/Outdoors"),
        ("wildlife", &["zoo", "sanctuary"], "Wildlife"),
        ("shopping", &["mall", "center"], "Shopping"),
    ];
    for preference in preferences {
        if let Some((_, _, category)) = BY_PREFERENCE
            .iter()
            .find(|(tag, keywords, _)| preference.contains(*tag) && contains_any(&lower, keywords))
        {
            return *category;
        }
    }

    "Attraction"
}

/// Pick a local tip from the interest bucket, else from the time of day
pub fn local_tip(
    preferences: &BTreeSet<String>,
    time_of_day: TimeOfDay,
    rng: &mut impl Rng,
) -> &'static str {
    let has = |tag: &str| preferences.iter().any(|preference| preference.contains(tag));

    let bucket: [&'static str; 2] = if has("photography") {
        match time_of_day {
            TimeOfDay::Morning => [
                "The morning light here creates perfect photography conditions. Bring your camera!",
                "Arrive before the crowds for clean shots in the soft morning light.",
            ],
            _ => [
                "The golden hour lighting just before sunset makes this spot a photographer's dream.",
                "Stay a little longer for the light to change; the late views are worth the wait.",
            ],
        }
    } else if has("budget") {
        [
            "Ask about discounted tickets or free entry hours.",
            "Consider purchasing a city pass for better value if visiting multiple attractions.",
        ]
    } else if has("family") {
        [
            "This place is particularly family-friendly, with activities for all ages.",
            "Ask about family tickets; children often enter at a reduced rate.",
        ]
    } else {
        match time_of_day {
            TimeOfDay::Morning => [
                "Visit early to avoid the crowds. This place gets busy after 11am.",
                "Visit early to avoid the crowds. Morning light makes for great photos here.",
            ],
            TimeOfDay::Afternoon => [
                "The ideal time to visit is 2-4pm when tour groups are less frequent.",
                "Consider booking in advance as this is a popular afternoon spot.",
            ],
            TimeOfDay::Evening => [
                "In the evening, the atmosphere becomes more intimate and relaxed.",
                "Check their website for evening events or special hours.",
            ],
        }
    };

    bucket[usize::from(rng.gen_bool(0.5))]
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ItineraryError, Result},
        types::{Day, ItineraryRequest},
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedPlace;

    #[async_trait]
    impl PlaceLookup for FixedPlace {
        async fn find_place(&self, query: &str) -> Result<Option<PlaceInfo>> {
            Ok(Some(PlaceInfo {
                name: query.to_string(),
                address: format!("1 Main St ({})", query),
                latitude: None,
                longitude: None,
            }))
        }
    }

    struct FailingSummary;

    #[async_trait]
    impl SummaryLookup for FailingSummary {
        async fn summary(&self, _title: &str) -> Result<Option<String>> {
            Err(ItineraryError::Lookup("offline".to_string()))
        }
    }

    struct FixedSummary;

    #[async_trait]
    impl SummaryLookup for FixedSummary {
        async fn summary(&self, title: &str) -> Result<Option<String>> {
            Ok(Some(format!("{} is well known.", title)))
        }
    }

    fn prefs(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|tag| tag.to_string()).collect()
    }

    fn draft() -> DraftItinerary {
        let request = ItineraryRequest::new(
            "Paris",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            2,
            ["history"],
        )
        .unwrap();
        let days = (1..=2)
            .map(|day_number| Day {
                day_number,
                date: request.date_for_day(day_number).unwrap(),
                activities: TimeOfDay::ALL
                    .iter()
                    .enumerate()
                    .map(|(idx, tod)| {
                        Activity::new(format!("Spot {}-{}", day_number, idx), *tod, "", idx as u32)
                    })
                    .collect(),
            })
            .collect();
        DraftItinerary::new(&request, days)
    }

    #[tokio::test]
    async fn test_enrich_without_lookups_uses_fallbacks() {
        let enricher = ActivityEnricher::new();
        let mut rng = StdRng::seed_from_u64(7);
        let activity = Activity::new("City Museum", TimeOfDay::Morning, "", 0);

        let enriched = enricher.enrich(activity, "Paris", &prefs(&[]), &mut rng).await;

        assert!(enriched.description.contains("cultural venue"));
        assert_eq!(enriched.address.as_deref(), Some("Paris"));
        assert_eq!(enriched.location.as_deref(), Some("City Museum"));
        let minutes = enriched.duration_minutes.unwrap();
        assert!((90..=150).contains(&minutes));
        assert!(TRANSPORT_OPTIONS.contains(&enriched.transportation.as_deref().unwrap()));
        assert_eq!(enriched.categories.as_deref(), Some("Museum/Gallery"));
        assert!(enriched.photo_url.is_none());
        assert!(enriched.local_tip.is_some());
    }

    #[tokio::test]
    async fn test_lookup_results_and_failures() {
        let enricher = ActivityEnricher::new()
            .with_place_lookup(Arc::new(FixedPlace))
            .with_summary_lookup(Arc::new(FailingSummary));
        let mut rng = StdRng::seed_from_u64(1);
        let activity = Activity::new("Old Harbour", TimeOfDay::Evening, "Boats at dusk.", 2);

        let enriched = enricher.enrich(activity, "Lisbon", &prefs(&[]), &mut rng).await;

        assert_eq!(enriched.description, "Boats at dusk.");
        assert_eq!(enriched.address.as_deref(), Some("1 Main St (Old Harbour Lisbon)"));
        assert_eq!(enriched.order_index, 2);
    }

    #[tokio::test]
    async fn test_summary_wins_over_existing_description() {
        let enricher = ActivityEnricher::new().with_summary_lookup(Arc::new(FixedSummary));
        let mut rng = StdRng::seed_from_u64(1);
        let activity = Activity::new("Belem Tower", TimeOfDay::Morning, "A tower.", 0);

        let enriched = enricher.enrich(activity, "Lisbon", &prefs(&[]), &mut rng).await;
        assert_eq!(enriched.description, "Belem Tower is well known.");
    }

    #[tokio::test]
    async fn test_existing_fields_are_kept() {
        let mut activity = Activity::new("Spot", TimeOfDay::Afternoon, "Nice.", 1);
        activity.duration_minutes = Some(45);
        activity.transportation = Some("Ferry".to_string());
        activity.categories = Some("Boat".to_string());

        let enriched = ActivityEnricher::new()
            .enrich(activity, "Oslo", &prefs(&[]), &mut StdRng::seed_from_u64(3))
            .await;

        assert_eq!(enriched.duration_minutes, Some(45));
        assert_eq!(enriched.transportation.as_deref(), Some("Ferry"));
        assert_eq!(enriched.categories.as_deref(), Some("Boat"));
    }

    #[tokio::test]
    async fn test_seeded_itinerary_enrichment_is_reproducible() {
        let enricher = ActivityEnricher::new().with_place_lookup(Arc::new(FixedPlace));

        let mut first = draft();
        let mut second = draft();
        enricher
            .enrich_itinerary(&mut first, &mut StdRng::seed_from_u64(42))
            .await;
        enricher
            .enrich_itinerary(&mut second, &mut StdRng::seed_from_u64(42))
            .await;

        assert_eq!(first, second);
        for day in first.days() {
            let order: Vec<u32> = day.activities.iter().map(|a| a.order_index).collect();
            assert_eq!(order, vec![0, 1, 2]);
            assert!(day.activities[0].name.starts_with(&format!("Spot {}-", day.day_number)));
        }
    }

    #[test]
    fn test_template_description_keywords() {
        let dining = template_description("Cafe Luna", "Rome", TimeOfDay::Evening);
        assert!(dining.contains("dining spot in Rome"));
        assert!(dining.contains("during the evening"));

        let park = template_description("Villa Borghese Gardens", "Rome", TimeOfDay::Morning);
        assert!(park.contains("peaceful retreat"));

        let other = template_description("Colosseum", "Rome", TimeOfDay::Afternoon);
        assert!(other.contains("must-visit attraction"));
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(infer_category("Temple of Heaven", &prefs(&[])), "Religious Site");
        assert_eq!(infer_category("Zoo Berlin", &prefs(&["wildlife"])), "Wildlife");
        assert_eq!(infer_category("Zoo Berlin", &prefs(&[])), "Attraction");
        assert_eq!(
            infer_category("Natural History Hall", &prefs(&["museums"])),
            "Museum/Gallery"
        );
    }

    #[test]
    fn test_local_tip_buckets() {
        let mut rng = StdRng::seed_from_u64(9);
        let budget = local_tip(&prefs(&["budget"]), TimeOfDay::Morning, &mut rng);
        assert!(budget.contains("discounted") || budget.contains("city pass"));

        let evening = local_tip(&prefs(&[]), TimeOfDay::Evening, &mut rng);
        assert!(evening.contains("evening"));

        let photo = local_tip(&prefs(&["photography"]), TimeOfDay::Morning, &mut rng);
        assert!(photo.contains("morning light"));
    }
}
