//! Species photos from the iNaturalist search API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{ConfigError, FetchError};

pub const NO_IMAGE_URL: &str = "https://via.placeholder.com/600x400?text=No+Image+Available";
pub const ERROR_IMAGE_URL: &str = "https://via.placeholder.com/600x400?text=Error+Fetching+Image";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    record: Option<TaxonRecord>,
}

#[derive(Debug, Deserialize)]
struct TaxonRecord {
    default_photo: Option<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    medium_url: Option<String>,
}

impl SearchResponse {
    fn first_photo(self) -> Option<String> {
        self.results
            .into_iter()
            .next()?
            .record?
            .default_photo?
            .medium_url
            .filter(|url| !url.is_empty())
    }
}

/// Resolves common names to photo URLs, remembering every answer.
///
/// One resolver lives as long as the view that shows the photos.
pub struct ImageResolver {
    client: Client,
    base_url: String,
    cache: Mutex<HashMap<String, String>>,
}

impl ImageResolver {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("birding-buddy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.inaturalist_base_url.trim_end_matches('/').to_string(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    async fn search_photo(&self, common_name: &str) -> Result<Option<String>, FetchError> {
        let url = format!("{}/v1/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", common_name)])
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|source| FetchError::Decode { url, source })?;
        Ok(body.first_photo())
    }

    /// A photo URL for `common_name`, or one of the placeholder URLs.
    pub async fn resolve_image(&self, common_name: &str) -> String {
        if let Some(cached) = self.cached(common_name) {
            debug!("Image for {} served from cache", common_name);
            return cached;
        }

        let resolved = match self.search_photo(common_name).await {
            Ok(Some(photo)) => photo,
            Ok(None) => NO_IMAGE_URL.to_string(),
            Err(e) => {
                error!("Error fetching image for {}: {}", common_name, e);
                ERROR_IMAGE_URL.to_string()
            }
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(common_name.to_string(), resolved.clone());
        }
        resolved
    }

    /// Resolve several names at once, at most `max_concurrent` in flight.
    /// URLs come back in the order of `names`.
    pub async fn resolve_many(&self, names: &[String], max_concurrent: usize) -> Vec<String> {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(max_concurrent.max(1)));

        let tasks = names.iter().map(|name| {
            let permit = Arc::clone(&semaphore);
            async move {
                let _permit = permit.acquire().await;
                self.resolve_image(name).await
            }
        });

        join_all(tasks).await
    }

    fn cached(&self, common_name: &str) -> Option<String> {
        self.cache.lock().ok()?.get(common_name).cloned()
    }
}
