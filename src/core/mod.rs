pub mod orchestrator;
pub mod steps;

pub use orchestrator::ItineraryOrchestrator;
pub use steps::GenerationStep;
