//! tiny-trip-rs: resilient itinerary generation on top of unreliable LLM providers
//!
//! The engine asks a chain of text-generation providers for a day-by-day trip
//! plan, pulls JSON out of whatever the model wrote, repairs and normalizes it,
//! optionally enriches each activity, and falls back to an offline generator
//! when every provider fails. A request always yields a well-formed itinerary.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use tiny_trip_rs::{EngineConfig, ItineraryRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = EngineConfig::from_env()?.build_orchestrator()?;
//!
//!     let request = ItineraryRequest::new(
//!         "Lisbon",
//!         NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
//!         3,
//!         ["food_wine", "history"],
//!     )?;
//!
//!     let result = orchestrator.generate(&request).await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod lookups;
pub mod providers;
pub mod schemas;
pub mod services;
pub mod types;

pub use config::EngineConfig;
pub use core::{GenerationStep, ItineraryOrchestrator};
pub use error::{ItineraryError, Result};
pub use providers::{OpenAiClient, OpenRouterClient, ProviderSettings, TextGenerationClient};
pub use services::{ActivityEnricher, MockItineraryGenerator, PromptSpec};
pub use types::{
    Activity, Day, GenerationResult, Itinerary, ItineraryForm, ItineraryRequest, SourceTag,
    TimeOfDay,
};

#[cfg(feature = "cli")]
pub mod cli;
