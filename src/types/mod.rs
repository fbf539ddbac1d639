pub mod itinerary;
pub mod provider_payload;
pub mod request;
pub mod result;

pub use itinerary::{Activity, Day, DraftItinerary, Itinerary, SourceTag, TimeOfDay};
pub use provider_payload::ProviderItinerary;
pub use request::{ItineraryForm, ItineraryRequest, Preference, MAX_DURATION_DAYS};
pub use result::GenerationResult;
