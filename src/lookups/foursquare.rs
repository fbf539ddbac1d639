use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{fetch_json, http_client, trim_base_url, AttractionLookup, LOOKUP_TIMEOUT};
use crate::error::Result;

pub const DEFAULT_FOURSQUARE_URL: &str = "https://api.foursquare.com/v3";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Venue>,
}

#[derive(Debug, Deserialize)]
struct Venue {
    #[serde(default)]
    name: Option<String>,
}

/// Foursquare Places search for popular sightseeing spots
#[derive(Debug, Clone)]
pub struct FoursquareAttractionLookup {
    api_key: String,
    base_url: String,
    category: String,
    client: Client,
}

impl FoursquareAttractionLookup {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: DEFAULT_FOURSQUARE_URL.to_string(),
            category: "attractions".to_string(),
            client: http_client(LOOKUP_TIMEOUT)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    /// Search term sent as `query`, "attractions" by default
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

#[async_trait]
impl AttractionLookup for FoursquareAttractionLookup {
    async fn popular_attractions(&self, destination: &str, limit: usize) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let request = self
            .client
            .get(format!("{}/places/search", self.base_url))
            .query(&[
                ("query", self.category.as_str()),
                ("near", destination),
                ("limit", limit.as_str()),
                ("sort", "POPULARITY"),
            ])
            .header("Accept", "application/json")
            .header("Authorization", self.api_key.as_str());

        let response: Option<SearchResponse> = fetch_json("foursquare", request).await?;
        Ok(response
            .map(|response| response.results)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|venue| venue.name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect())
    }
}
