//! Best-effort lookup collaborators used for enrichment and prompt grounding.
//!
//! Every lookup is behind a trait so the enricher and orchestrator can be
//! wired with fakes in tests. Adapters return `Ok(None)` / an empty list when
//! the remote service has nothing to say, and [`ItineraryError::Lookup`] when
//! the call itself failed; callers swallow both.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ItineraryError, Result};

pub mod foursquare;
pub mod nominatim;
pub mod unsplash;
pub mod wikipedia;

pub use foursquare::FoursquareAttractionLookup;
pub use nominatim::NominatimPlaceLookup;
pub use unsplash::UnsplashPhotoLookup;
pub use wikipedia::WikipediaSummaryLookup;

/// Default timeout applied to every lookup request
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// A resolved place
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceInfo {
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Resolve a free-text query to a place and its address
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn find_place(&self, query: &str) -> Result<Option<PlaceInfo>>;
}

/// Short encyclopedic summary for a title
#[async_trait]
pub trait SummaryLookup: Send + Sync {
    async fn summary(&self, title: &str) -> Result<Option<String>>;
}

/// Representative photo URL for a query
#[async_trait]
pub trait PhotoLookup: Send + Sync {
    async fn photo_url(&self, query: &str) -> Result<Option<String>>;
}

/// Popular attractions at a destination, most popular first
#[async_trait]
pub trait AttractionLookup: Send + Sync {
    async fn popular_attractions(&self, destination: &str, limit: usize) -> Result<Vec<String>>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tiny-trip-rs/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| ItineraryError::Config(format!("Failed to build HTTP client: {err}")))
}

/// Send a lookup request and decode its JSON body.
///
/// A 404 is "nothing found" rather than a failure.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    service: &str,
    request: RequestBuilder,
) -> Result<Option<T>> {
    let response = request
        .send()
        .await
        .map_err(|err| ItineraryError::Lookup(format!("{service} request failed: {err}")))?;

    let status = response.status();
    debug!(target: "tinytrip::lookup", service, status = status.as_u16(), "lookup response");

    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ItineraryError::Lookup(format!(
            "{service} returned status {status}"
        )));
    }

    response
        .json::<T>()
        .await
        .map(Some)
        .map_err(|err| ItineraryError::Lookup(format!("{service} returned invalid JSON: {err}")))
}

pub(crate) fn trim_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}
