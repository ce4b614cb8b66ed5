use std::fs::File;
use std::path::Path;

use csv::Writer;
use log::{error, info};
use reqwest::Client;

use crate::config::{Config, Location};
use crate::error::{ConfigError, FetchError};
use crate::record::SightingRecord;

const TOKEN_HEADER: &str = "X-eBirdApiToken";

/// Client for the eBird recent-observations endpoint.
pub struct SightingClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    location: Location,
}

impl SightingClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("birding-buddy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ebird_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            location: config.location,
        })
    }

    /// Recent sightings around the configured location.
    pub async fn fetch_recent(&self) -> Result<Vec<SightingRecord>, FetchError> {
        self.fetch_recent_at(self.location).await
    }

    pub async fn fetch_recent_at(
        &self,
        location: Location,
    ) -> Result<Vec<SightingRecord>, FetchError> {
        let url = format!("{}/data/obs/geo/recent", self.base_url);

        let mut request = self
            .client
            .get(&url)
            .query(&[("lat", location.lat), ("lng", location.lng)]);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|source| FetchError::Transport {
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

        let records: Vec<SightingRecord> = response
            .json()
            .await
            .map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;

        info!(
            "Fetched {} recent sightings around {:.4}, {:.4}",
            records.len(),
            location.lat,
            location.lng
        );
        Ok(records)
    }

    /// Like [`fetch_recent`](Self::fetch_recent) but logs failures and
    /// returns an empty list instead.
    pub async fn fetch_recent_or_empty(&self) -> Vec<SightingRecord> {
        match self.fetch_recent().await {
            Ok(records) => records,
            Err(e) => {
                error!("Error fetching bird sightings: {}", e);
                Vec::new()
            }
        }
    }
}

/// Records whose common name contains `filter`, ignoring case.
pub fn search(recent: &[SightingRecord], filter: &str) -> Vec<SightingRecord> {
    let needle = filter.to_lowercase();
    recent
        .iter()
        .filter(|record| record.com_name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Save records to CSV file
pub fn save_to_csv(
    records: &[SightingRecord],
    filename: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    info!("Data saved to {}", filename.display());
    Ok(())
}
