use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const UNSPLASH_API_URL: &str = "https://api.unsplash.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    urls: ImageUrls,
}

#[derive(Debug, Deserialize)]
struct ImageUrls {
    regular: String,
}

/// Best-effort photo lookup. Decoration only: every failure mode resolves
/// to `None`, nothing here can fail a request.
#[derive(Clone)]
pub struct ImageService {
    client: Client,
    access_key: Option<String>,
    base_url: String,
}

impl ImageService {
    pub fn new(access_key: Option<String>) -> Self {
        Self::with_base_url(access_key, UNSPLASH_API_URL.to_string())
    }

    pub fn with_base_url(access_key: Option<String>, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("travel-api/1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            access_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a free-text query to a representative photo URL, or `None`.
    pub async fn get_image(&self, query: &str) -> Option<String> {
        let access_key = self.access_key.as_ref()?;

        let url = format!("{}/search/photos", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("query", format!("{} travel", query)), ("per_page", "1".to_string())])
            .header("Authorization", format!("Client-ID {}", access_key))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Unsplash request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Unsplash returned status {}", response.status());
            return None;
        }

        match response.json::<SearchResponse>().await {
            Ok(data) => data.results.into_iter().next().map(|r| r.urls.regular),
            Err(e) => {
                warn!("Unsplash payload decode failed: {}", e);
                None
            }
        }
    }
}
