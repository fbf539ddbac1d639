//! Offline itinerary generator used when every provider has failed.
//!
//! Always produces exactly three activities per day (Morning, Afternoon,
//! Evening) drawn from themed pools, with no I/O, so it cannot fail.

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::types::{Activity, Day, DraftItinerary, ItineraryRequest, TimeOfDay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityTemplate {
    pub name: &'static str,
    pub description: &'static str,
}

const fn template(name: &'static str, description: &'static str) -> ActivityTemplate {
    ActivityTemplate { name, description }
}

/// A themed set of activities and the preference tags that select it
#[derive(Debug, Clone, Copy)]
pub struct ActivityPool {
    pub id: &'static str,
    pub label: &'static str,
    pub tags: &'static [&'static str],
    pub entries: [ActivityTemplate; 4],
}

impl ActivityPool {
    fn matches(&self, preference: &str) -> bool {
        preference == self.id
            || preference.eq_ignore_ascii_case(self.label)
            || self.tags.contains(&preference)
    }
}

pub static POOLS: [ActivityPool; 8] = [
    ActivityPool {
        id: "nature",
        label: "Nature & Parks",
        tags: &["hiking", "wildlife", "beach"],
        entries: [
            template("Hiking in the local trails", "Explore the beautiful natural landscapes and hiking trails around the area. Perfect for nature enthusiasts and photographers."),
            template("Visit to the Botanical Garden", "Discover exotic plants and flowers in this beautifully maintained garden. A peaceful retreat from the busy city."),
            template("Picnic in the Central Park", "Enjoy a relaxing picnic surrounded by greenery. Bring some local snacks and drinks for a perfect outdoor meal."),
            template("Wildlife Sanctuary Tour", "Observe local wildlife in their natural habitat. Guided tours available with knowledgeable naturalists."),
        ],
    },
    ActivityPool {
        id: "history",
        label: "Museums & History",
        tags: &["museums", "culture"],
        entries: [
            template("National History Museum Visit", "Explore artifacts and exhibits showcasing the rich history of the region. Allow at least 2-3 hours for a thorough visit."),
            template("Guided Tour of the Old Town", "Walk through historic streets with a knowledgeable guide explaining the architectural and cultural significance of landmarks."),
            template("Art Gallery Exhibition", "View contemporary and classic art pieces from local and international artists. The gallery often rotates special exhibitions."),
            template("Archaeological Site Exploration", "Discover ancient ruins and learn about the civilizations that once thrived in this area."),
        ],
    },
    ActivityPool {
        id: "food",
        label: "Food & Drink",
        tags: &["food_wine"],
        entries: [
            template("Culinary Walking Tour", "Sample local delicacies while walking through food districts. A great way to taste multiple specialties in one go."),
            template("Cooking Class with Local Chef", "Learn to prepare traditional dishes with fresh, local ingredients. Take home recipes to recreate the flavors."),
            template("Wine Tasting at Regional Vineyard", "Sample locally produced wines with expert commentary on flavor profiles and production methods."),
            template("Street Food Market Exploration", "Wander through bustling food stalls offering authentic local cuisine at affordable prices."),
        ],
    },
    ActivityPool {
        id: "adventure",
        label: "Adventure Sports",
        tags: &[],
        entries: [
            template("White Water Rafting Experience", "Navigate through exciting rapids with experienced guides. Suitable for beginners and advanced rafters alike."),
            template("Mountain Biking on Scenic Trails", "Ride through challenging terrain with breathtaking views. Bikes and safety equipment available for rent."),
            template("Rock Climbing Adventure", "Scale natural rock formations with professional instructors ensuring safety while providing an adrenaline rush."),
            template("Paragliding over the Valley", "Soar through the skies and enjoy a bird's eye view of the spectacular landscape below."),
        ],
    },
    ActivityPool {
        id: "shopping",
        label: "Shopping",
        tags: &[],
        entries: [
            template("Local Artisan Market", "Browse handcrafted goods made by local artisans. Perfect for finding unique souvenirs and gifts."),
            template("Luxury Shopping District", "Explore high-end boutiques and designer stores for premium shopping experience."),
            template("Antique Shop Hopping", "Hunt for vintage treasures and collectibles in charming antique shops scattered throughout the old district."),
            template("Farmers Market Visit", "Purchase fresh local produce, artisanal foods, and handmade crafts directly from producers."),
        ],
    },
    ActivityPool {
        id: "wellness",
        label: "Relaxation & Wellness",
        tags: &["relaxation"],
        entries: [
            template("Day Spa Treatment", "Indulge in massages, facials, and body treatments using local ingredients and techniques."),
            template("Yoga Session by the Beach", "Find inner peace with a guided yoga session against the soothing backdrop of waves."),
            template("Hot Springs Relaxation", "Soak in natural thermal waters known for their therapeutic properties and mineral content."),
            template("Meditation Retreat", "Join a guided meditation session in a tranquil setting to rejuvenate your mind and spirit."),
        ],
    },
    ActivityPool {
        id: "nightlife",
        label: "Nightlife",
        tags: &[],
        entries: [
            template("Live Music at Jazz Club", "Enjoy performances by talented musicians in an intimate setting with great acoustics."),
            template("Rooftop Bar with City Views", "Sip craft cocktails while taking in panoramic views of the city skyline illuminated at night."),
            template("Cultural Dance Performance", "Watch traditional dance performances that tell stories of local culture and history."),
            template("Night Food Market Tour", "Experience the vibrant atmosphere of night markets offering local delicacies and street food."),
        ],
    },
    ActivityPool {
        id: "photography",
        label: "Photography Spots",
        tags: &[],
        entries: [
            template("Sunrise Photography at Scenic Overlook", "Capture the golden light of dawn illuminating the landscape from a perfect vantage point."),
            template("Architectural Photography Tour", "Focus on capturing the unique architectural elements that define the city's character."),
            template("Wildlife Photography Excursion", "Photograph local wildlife in their natural habitat with guidance from experienced nature photographers."),
            template("Night Photography Session", "Learn techniques for capturing city lights, stars, and night scenes with long exposure photography."),
        ],
    },
];

/// Used when no preference is given or the picked tag matches no pool
pub static DEFAULT_POOL: [ActivityTemplate; 6] = [
    template("City Sightseeing Tour", "Explore the main attractions and landmarks of the city with a knowledgeable guide providing historical context."),
    template("Local Cuisine Tasting", "Sample authentic dishes that represent the culinary traditions of the region at a well-regarded local restaurant."),
    template("Cultural Heritage Site Visit", "Discover the historical and cultural significance of one of the area's most important landmarks."),
    template("Scenic Nature Walk", "Enjoy a leisurely stroll through beautiful natural surroundings, perfect for taking in the local flora and fauna."),
    template("Shopping at Local Markets", "Browse through stalls offering everything from handcrafted souvenirs to fresh local produce."),
    template("Relaxation Time at Popular Beach", "Unwind on sandy shores with the sound of waves providing a peaceful backdrop for relaxation."),
];

/// Pool selected by a preference tag, if any
pub fn pool_for(preference: &str) -> Option<&'static ActivityPool> {
    POOLS.iter().find(|pool| pool.matches(preference))
}

#[derive(Debug, Clone, Default)]
pub struct MockItineraryGenerator {
    seed: Option<u64>,
}

impl MockItineraryGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose output is fully determined by `seed`
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn generate(&self, request: &ItineraryRequest) -> DraftItinerary {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generate_with(request, &mut rng)
    }

    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        request: &ItineraryRequest,
        rng: &mut R,
    ) -> DraftItinerary {
        let preferences: Vec<&str> = request.preferences().iter().map(String::as_str).collect();

        let days = request
            .trip_days()
            .map(|(day_number, date)| Day {
                day_number,
                date,
                activities: TimeOfDay::ALL
                    .iter()
                    .enumerate()
                    .map(|(slot, time_of_day)| {
                        let picked = pick_template(&preferences, rng);
                        Activity::new(
                            format!("{} in {}", picked.name, request.destination()),
                            *time_of_day,
                            picked.description,
                            slot as u32,
                        )
                    })
                    .collect(),
            })
            .collect();

        DraftItinerary::new(request, days)
    }
}

fn pick_template<R: Rng + ?Sized>(preferences: &[&str], rng: &mut R) -> ActivityTemplate {
    let pool: &[ActivityTemplate] = preferences
        .choose(rng)
        .and_then(|preference| pool_for(preference))
        .map(|pool| &pool.entries[..])
        .unwrap_or(&DEFAULT_POOL[..]);

    pool.choose(rng).copied().unwrap_or(DEFAULT_POOL[0])
}
