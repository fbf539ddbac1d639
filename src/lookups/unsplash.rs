use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{fetch_json, http_client, trim_base_url, PhotoLookup, LOOKUP_TIMEOUT};
use crate::error::Result;

pub const DEFAULT_UNSPLASH_URL: &str = "https://api.unsplash.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    #[serde(default)]
    small: Option<String>,
    #[serde(default)]
    regular: Option<String>,
}

/// Unsplash photo search, authenticated with an access key
#[derive(Debug, Clone)]
pub struct UnsplashPhotoLookup {
    access_key: String,
    base_url: String,
    client: Client,
}

impl UnsplashPhotoLookup {
    pub fn new(access_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            access_key: access_key.into(),
            base_url: DEFAULT_UNSPLASH_URL.to_string(),
            client: http_client(LOOKUP_TIMEOUT)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

#[async_trait]
impl PhotoLookup for UnsplashPhotoLookup {
    async fn photo_url(&self, query: &str) -> Result<Option<String>> {
        let request = self
            .client
            .get(format!("{}/search/photos", self.base_url))
            .query(&[("query", query), ("per_page", "1")])
            .header("Authorization", format!("Client-ID {}", self.access_key));

        let response: Option<SearchResponse> = fetch_json("unsplash", request).await?;
        Ok(response
            .and_then(|response| response.results.into_iter().next())
            .and_then(|photo| photo.urls.small.or(photo.urls.regular)))
    }
}
