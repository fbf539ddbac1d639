use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{fetch_json, http_client, trim_base_url, SummaryLookup, LOOKUP_TIMEOUT};
use crate::error::{ItineraryError, Result};

pub const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: Option<String>,
}

/// Wikipedia REST page summaries. No credential required.
#[derive(Debug, Clone)]
pub struct WikipediaSummaryLookup {
    base_url: String,
    client: Client,
}

impl WikipediaSummaryLookup {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_WIKIPEDIA_URL.to_string(),
            client: http_client(LOOKUP_TIMEOUT)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    fn page_url(&self, title: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ItineraryError::Config(format!("Invalid Wikipedia URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ItineraryError::Config("Wikipedia URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(title);
        Ok(url)
    }
}

/// `Eiffel Tower!` becomes `Eiffel_Tower`
fn page_title(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[async_trait]
impl SummaryLookup for WikipediaSummaryLookup {
    async fn summary(&self, title: &str) -> Result<Option<String>> {
        let title = page_title(title);
        if title.is_empty() {
            return Ok(None);
        }

        let request = self.client.get(self.page_url(&title)?);
        let page: Option<PageSummary> = fetch_json("wikipedia", request).await?;
        Ok(page
            .and_then(|page| page.extract)
            .map(|extract| extract.trim().to_string())
            .filter(|extract| !extract.is_empty()))
    }
}
