pub mod chat_client;
pub mod enrichment;
pub mod extractor;
pub mod mock;
pub mod normalizer;
pub mod prompt;

pub use enrichment::ActivityEnricher;
pub use extractor::{extract, extract_json, ExtractedJson};
pub use mock::MockItineraryGenerator;
pub use normalizer::normalize;
pub use prompt::PromptSpec;
