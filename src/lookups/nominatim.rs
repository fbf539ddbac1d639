use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{fetch_json, http_client, trim_base_url, PlaceInfo, PlaceLookup, LOOKUP_TIMEOUT};
use crate::error::Result;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
}

/// OpenStreetMap Nominatim search. No credential required.
#[derive(Debug, Clone)]
pub struct NominatimPlaceLookup {
    base_url: String,
    client: Client,
}

impl NominatimPlaceLookup {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            client: http_client(LOOKUP_TIMEOUT)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

#[async_trait]
impl PlaceLookup for NominatimPlaceLookup {
    async fn find_place(&self, query: &str) -> Result<Option<PlaceInfo>> {
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .header("Accept-Language", "en-US,en;q=0.9");

        let places: Option<Vec<NominatimPlace>> = fetch_json("nominatim", request).await?;
        Ok(places
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|place| into_place_info(place, query)))
    }
}

fn into_place_info(place: NominatimPlace, query: &str) -> Option<PlaceInfo> {
    let address = place.display_name.trim().to_string();
    if address.is_empty() {
        return None;
    }

    let name = address
        .split(',')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(query)
        .to_string();

    Some(PlaceInfo {
        name,
        address,
        latitude: place.lat.and_then(|lat| lat.parse().ok()),
        longitude: place.lon.and_then(|lon| lon.parse().ok()),
    })
}
